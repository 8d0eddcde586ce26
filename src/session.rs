use crate::models::ProfileSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    SignedOut,
    SignedIn { token: String, display_name: String },
}

/// Credentials and the last rendered view for one dashboard session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
    view: Option<ProfileSummary>,
}

impl Session {
    /// Fresh session, as on page load: nothing carried over.
    pub fn init() -> Self {
        Self {
            state: SessionState::SignedOut,
            view: None,
        }
    }

    pub fn sign_in(&mut self, token: String, display_name: String) {
        self.state = SessionState::SignedIn {
            token,
            display_name,
        };
    }

    pub fn logout(&mut self) {
        tracing::debug!("session cleared");
        *self = Self::init();
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::SignedIn { token, .. } => Some(token),
            SessionState::SignedOut => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::SignedIn { display_name, .. } => Some(display_name),
            SessionState::SignedOut => None,
        }
    }

    pub fn view(&self) -> Option<&ProfileSummary> {
        self.view.as_ref()
    }

    /// Replaces the current view. The display name follows the fetched login.
    pub fn show(&mut self, summary: ProfileSummary) -> &ProfileSummary {
        if let SessionState::SignedIn { display_name, .. } = &mut self.state {
            if !summary.login.is_empty() {
                *display_name = summary.login.clone();
            }
        }
        self.view.insert(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BarChartSeries, SkillBreakdown};

    fn summary(login: &str) -> ProfileSummary {
        ProfileSummary {
            id: 1,
            login: login.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            audit_count: 0,
            group_count: 0,
            audit_ratio: None,
            total_xp_kb: 70,
            xp_over_time: BarChartSeries {
                buckets: Vec::new(),
                x_domain: None,
                y_domain: (0.0, 0.0),
            },
            skills: SkillBreakdown::NoData,
        }
    }

    #[test]
    fn init_starts_signed_out() {
        let session = Session::init();
        assert_eq!(session.display_name(), None);
        assert_eq!(session.token(), None);
        assert!(session.view().is_none());
    }

    #[test]
    fn show_updates_display_name_to_login() {
        let mut session = Session::init();
        session.sign_in("a.b.c".to_string(), "typed-name".to_string());
        session.show(summary("platform-login"));
        assert_eq!(session.display_name(), Some("platform-login"));
        assert_eq!(session.token(), Some("a.b.c"));
    }

    #[test]
    fn logout_clears_credentials_and_view() {
        let mut session = Session::init();
        session.sign_in("a.b.c".to_string(), "avery".to_string());
        session.show(summary("avery"));
        session.logout();
        assert_eq!(session, Session::init());
    }
}
