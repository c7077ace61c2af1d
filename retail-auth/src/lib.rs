// Session model shared by the client pieces
pub mod common;

// Authenticated HTTP client: session store, interceptor, refresh coordinator
pub mod client;
mod error;

pub use client::{
    connect, connect_from_config, ApiError, ApiRequest, ApiResponse, AuthenticatedClient,
    Authenticator, BroadcastNotifier, FailureClass, FailureClassifier, FileSessionStorage,
    Interceptor, MemorySessionStorage, RefreshCoordinator, RefreshOutcome, ServerAuthClient,
    SessionEvent, SessionNotifier, SessionStorage, SessionStore, Settings, TokenRefresher,
    SESSION_EXPIRED_MESSAGE,
};
pub use client::auth_client::AuthClientError;
pub use common::{RefreshGrant, Session, StoredSession, UserProfile};
pub use error::AuthError;
