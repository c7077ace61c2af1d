use tokio::sync::broadcast;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Told once each time a refresh cycle gives up and the session is dropped
pub trait SessionNotifier: Send + Sync {
    fn session_expired(&self);
}

impl<F> SessionNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn session_expired(&self) {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Expired { message: String },
}

/// Fans session events out to every subscriber (UI, logging, ...)
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionNotifier for BroadcastNotifier {
    fn session_expired(&self) {
        let event = SessionEvent::Expired {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        };
        // No subscribers is fine
        if self.sender.send(event).is_err() {
            tracing::debug!("Session expired with no subscribers listening");
        }
    }
}
