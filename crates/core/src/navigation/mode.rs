use serde::{Deserialize, Serialize};

use super::Screen;
use crate::models::Role;

/// Coarse application mode derived from the signed-in role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppMode {
    /// No signed-in user; behaves like a recipient.
    #[default]
    Guest,
    Recipient,
    Partner,
    Admin,
}

impl AppMode {
    pub fn from_role(role: Option<Role>) -> Self {
        match role {
            None => AppMode::Guest,
            Some(Role::Recipient) => AppMode::Recipient,
            Some(Role::Partner) => AppMode::Partner,
            Some(Role::Admin) => AppMode::Admin,
        }
    }

    /// Root screen shown right after authentication.
    pub fn home_screen(&self) -> Screen {
        match self {
            AppMode::Admin => Screen::AdminDashboard,
            AppMode::Partner => Screen::PartnerDashboard,
            AppMode::Recipient | AppMode::Guest => Screen::Home,
        }
    }

    pub fn shell(&self) -> Shell {
        match self {
            AppMode::Admin => Shell::Admin,
            _ => Shell::Mobile,
        }
    }

    /// Bottom tabs for the mobile shell, empty for admins.
    pub fn tabs(&self) -> &'static [Screen] {
        match self {
            AppMode::Guest | AppMode::Recipient => &RECIPIENT_TABS,
            AppMode::Partner => &PARTNER_TABS,
            AppMode::Admin => &[],
        }
    }

    /// Resolves what the shell should mount for `current`.
    pub fn layout(&self, current: Screen) -> Layout {
        match self {
            AppMode::Admin => {
                let content = if current.is_admin() {
                    current
                } else {
                    Screen::AdminDashboard
                };
                Layout {
                    shell: Shell::Admin,
                    content: ScreenView::Screen(content),
                    tab_bar: None,
                    sidebar: Some(Sidebar {
                        entries: &ADMIN_SIDEBAR,
                        active: content,
                    }),
                }
            }
            _ => {
                let content = match current {
                    Screen::Profile if *self == AppMode::Partner => ScreenView::PartnerProfile,
                    Screen::Profile => ScreenView::RecipientProfile,
                    other => ScreenView::Screen(other),
                };
                let tab_bar = current.is_main().then(|| TabBar {
                    tabs: self.tabs(),
                    active: self.active_tab(current),
                });
                Layout {
                    shell: Shell::Mobile,
                    content,
                    tab_bar,
                    sidebar: None,
                }
            }
        }
    }

    fn active_tab(&self, current: Screen) -> Option<Screen> {
        if *self == AppMode::Partner && current == Screen::CheckQuality {
            return Some(Screen::PartnerDashboard);
        }
        self.tabs().iter().copied().find(|tab| *tab == current)
    }
}

const RECIPIENT_TABS: [Screen; 2] = [Screen::Home, Screen::Profile];

const PARTNER_TABS: [Screen; 4] = [
    Screen::PartnerDashboard,
    Screen::Transactions,
    Screen::PartnerInventory,
    Screen::Profile,
];

const ADMIN_SIDEBAR: [Screen; 5] = [
    Screen::AdminDashboard,
    Screen::AdminUsers,
    Screen::AdminProducts,
    Screen::AdminReports,
    Screen::AdminSettings,
];

/// The two structurally different rendering frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// Fixed sidebar plus content pane.
    Admin,
    /// Single pane with an optional bottom tab bar.
    Mobile,
}

/// What the content pane mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenView {
    Screen(Screen),
    RecipientProfile,
    PartnerProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabBar {
    pub tabs: &'static [Screen],
    pub active: Option<Screen>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sidebar {
    pub entries: &'static [Screen],
    pub active: Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub shell: Shell,
    pub content: ScreenView,
    pub tab_bar: Option<TabBar>,
    pub sidebar: Option<Sidebar>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_screen_follows_role() {
        assert_eq!(AppMode::from_role(None).home_screen(), Screen::Home);
        assert_eq!(
            AppMode::from_role(Some(Role::Recipient)).home_screen(),
            Screen::Home
        );
        assert_eq!(
            AppMode::from_role(Some(Role::Partner)).home_screen(),
            Screen::PartnerDashboard
        );
        assert_eq!(
            AppMode::from_role(Some(Role::Admin)).home_screen(),
            Screen::AdminDashboard
        );
    }

    #[test]
    fn tab_bar_only_on_main_screens() {
        let layout = AppMode::Recipient.layout(Screen::Home);
        assert_eq!(layout.shell, Shell::Mobile);
        let tab_bar = layout.tab_bar.unwrap();
        assert_eq!(tab_bar.tabs, &[Screen::Home, Screen::Profile]);
        assert_eq!(tab_bar.active, Some(Screen::Home));

        assert!(AppMode::Recipient.layout(Screen::Explore).tab_bar.is_none());
        assert!(AppMode::Guest.layout(Screen::Login).tab_bar.is_none());
    }

    #[test]
    fn partner_dashboard_tab_highlighted_during_quality_check() {
        let layout = AppMode::Partner.layout(Screen::CheckQuality);
        let tab_bar = layout.tab_bar.unwrap();
        assert_eq!(tab_bar.tabs.len(), 4);
        assert_eq!(tab_bar.active, Some(Screen::PartnerDashboard));
    }

    #[test]
    fn profile_variant_depends_on_mode() {
        assert_eq!(
            AppMode::Partner.layout(Screen::Profile).content,
            ScreenView::PartnerProfile
        );
        assert_eq!(
            AppMode::Recipient.layout(Screen::Profile).content,
            ScreenView::RecipientProfile
        );
    }

    #[test]
    fn admin_shell_falls_back_to_dashboard() {
        let layout = AppMode::Admin.layout(Screen::Home);
        assert_eq!(layout.shell, Shell::Admin);
        assert_eq!(layout.content, ScreenView::Screen(Screen::AdminDashboard));
        assert!(layout.tab_bar.is_none());

        let layout = AppMode::Admin.layout(Screen::AdminReports);
        assert_eq!(layout.sidebar.unwrap().active, Screen::AdminReports);
    }
}
