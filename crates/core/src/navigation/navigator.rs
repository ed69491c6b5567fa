use super::Screen;

/// Current screen plus the stack of previously shown screens.
///
/// `back_stack` only holds *previous* screens; the current one is never on
/// it. None of the operations can fail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationState {
    current: Screen,
    back_stack: Vec<Screen>,
}

impl NavigationState {
    /// Fresh state on the login screen.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn back_stack(&self) -> &[Screen] {
        &self.back_stack
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    /// Pushes the current screen and shows `target`. Any target is legal.
    pub fn navigate(&mut self, target: Screen) {
        self.back_stack.push(self.current);
        self.current = target;
    }

    /// Pops one screen and shows it; no-op on an empty stack.
    ///
    /// Returns whether the current screen changed.
    pub fn go_back(&mut self) -> bool {
        match self.back_stack.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Drops the drill-down history and shows `target`.
    pub fn reset_to(&mut self, target: Screen) {
        self.back_stack.clear();
        self.current = target;
    }
}
