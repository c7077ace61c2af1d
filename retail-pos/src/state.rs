use retail_auth::{SessionEvent, UserProfile};

#[derive(Debug, Default)]
pub struct AppState {
    pub should_quit: bool,
    pub user: Option<UserProfile>,
    /// Set when the session ended under us; cleared by the next sign-in
    pub session_expired: bool,
    pub last_notice: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(&mut self, user: UserProfile) {
        self.user = Some(user);
        self.session_expired = false;
        self.last_notice = None;
    }

    pub fn signed_out(&mut self) {
        self.user = None;
    }

    /// Apply a session event and return the notice to show the operator
    pub fn reduce_session_event(&mut self, event: SessionEvent) -> &str {
        match event {
            SessionEvent::Expired { message } => {
                self.user = None;
                self.session_expired = true;
                self.last_notice.insert(message).as_str()
            }
        }
    }
}
