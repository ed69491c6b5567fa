use serde::{Deserialize, Serialize};

/// Every mountable screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Screen {
    #[default]
    Login,
    Signup,
    ForgotPassword,
    Verification,
    NewPassword,
    Home,
    Profile,
    EditProfile,
    ChangePassword,
    NotificationSettings,
    AddAddress,
    CheckQuality,
    Notifications,
    HelpFaq,
    MapView,
    PartnerDetail,
    ReportProduct,
    ReservationForm,
    ReservationSuccess,
    ImpactReport,
    History,
    RatingHistory,
    Explore,
    SavedItems,
    LocationSelect,
    CreateRequest,
    PartnerDashboard,
    PartnerInventory,
    Transactions,
    UploadProduct,
    Success,
    AdminDashboard,
    AdminUsers,
    AdminProducts,
    AdminReports,
    AdminSettings,
}

impl Screen {
    /// Screens that show the bottom tab bar in the mobile shell.
    pub const MAIN: [Screen; 6] = [
        Screen::Home,
        Screen::Profile,
        Screen::PartnerDashboard,
        Screen::PartnerInventory,
        Screen::Transactions,
        Screen::CheckQuality,
    ];

    pub fn is_main(&self) -> bool {
        Self::MAIN.contains(self)
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Screen::AdminDashboard
                | Screen::AdminUsers
                | Screen::AdminProducts
                | Screen::AdminReports
                | Screen::AdminSettings
        )
    }

    /// Screens reachable without a signed-in user.
    pub fn is_auth_flow(&self) -> bool {
        matches!(
            self,
            Screen::Login
                | Screen::Signup
                | Screen::ForgotPassword
                | Screen::Verification
                | Screen::NewPassword
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Screen::PartnerDashboard).unwrap(),
            "\"PARTNER_DASHBOARD\""
        );
        let screen: Screen = serde_json::from_str("\"HELP_FAQ\"").unwrap();
        assert_eq!(screen, Screen::HelpFaq);
    }

    #[test]
    fn main_screens_are_flagged() {
        assert!(Screen::CheckQuality.is_main());
        assert!(!Screen::UploadProduct.is_main());
        assert!(Screen::AdminReports.is_admin());
        assert!(Screen::Signup.is_auth_flow());
    }
}
