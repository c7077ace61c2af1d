pub mod auth_client;
mod classifier;
mod config;
mod coordinator;
mod http;
mod interceptor;
mod notifier;
pub mod replay;
mod request;
mod session_store;
mod token_storage;

pub use auth_client::ServerAuthClient;
pub use classifier::{FailureClass, FailureClassifier};
pub use config::Settings;
pub use coordinator::{RefreshCoordinator, RefreshOutcome, TokenRefresher};
pub use http::{ApiError, AuthenticatedClient};
pub use interceptor::Interceptor;
pub use notifier::{BroadcastNotifier, SessionEvent, SessionNotifier, SESSION_EXPIRED_MESSAGE};
pub use request::{ApiRequest, ApiResponse};
pub use session_store::SessionStore;
pub use token_storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::common::{Session, UserProfile};
use crate::error::AuthError;

/// Refresh ahead of time when the token expires within this window
const EXPIRY_BUFFER: Duration = Duration::minutes(5);

/// Everything a front end needs to stay signed in: the session store, the
/// login/logout endpoints and an API client that refreshes on its own.
#[derive(Clone)]
pub struct Authenticator {
    store: SessionStore,
    auth_client: ServerAuthClient,
    api: AuthenticatedClient<ServerAuthClient>,
    notifier: BroadcastNotifier,
}

/// Load [`Settings`] from the config file and environment, then [`connect`]
pub fn connect_from_config() -> Result<Authenticator, AuthError> {
    let settings = Settings::new()?;
    connect(&settings)
}

/// Wire up the session machinery from settings, restoring any persisted session
pub fn connect(settings: &Settings) -> Result<Authenticator, AuthError> {
    settings.validate().map_err(AuthError::Configuration)?;

    let storage: Arc<dyn SessionStorage> = match &settings.session_file {
        Some(path) => Arc::new(FileSessionStorage::at(path.clone())?),
        None => Arc::new(FileSessionStorage::new()?),
    };

    let http_client = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .map_err(|e| AuthError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Authenticator::new(
        SessionStore::restore(storage),
        http_client,
        settings,
    ))
}

impl Authenticator {
    pub fn new(store: SessionStore, http_client: reqwest::Client, settings: &Settings) -> Self {
        let auth_client = ServerAuthClient::with_client(http_client.clone(), settings);
        let notifier = BroadcastNotifier::new();

        let coordinator = RefreshCoordinator::new(
            store.clone(),
            auth_client.clone(),
            Arc::new(notifier.clone()),
            settings.refresh_timeout(),
        );
        let api = AuthenticatedClient::new(
            http_client,
            settings.api_url.clone(),
            Interceptor::new(store.clone()),
            FailureClassifier::new(settings.auth_paths()),
            coordinator,
        );

        Self {
            store,
            auth_client,
            api,
            notifier,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn api(&self) -> &AuthenticatedClient<ServerAuthClient> {
        &self.api
    }

    /// Session-expired events, one per failed refresh
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.notifier.subscribe()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, AuthError> {
        let resp = self.auth_client.login(username, password).await?;
        let user = resp.user.clone();
        self.store.establish(Session::from(resp))?;
        Ok(user)
    }

    /// Best-effort server logout; the local session is cleared regardless
    pub async fn logout(&self) {
        let token = self.store.access_token();
        if let Err(e) = self.auth_client.logout(token.as_ref()).await {
            tracing::warn!("Server logout failed: {}", e);
        }
        self.store.clear();
    }

    /// Refresh ahead of time if the stored token is about to expire.
    /// Returns false when the session is gone afterwards.
    pub async fn ensure_fresh(&self) -> bool {
        let session = self.store.snapshot();
        if !session.is_authenticated() {
            return false;
        }
        if !session.is_expiring(Utc::now(), EXPIRY_BUFFER) {
            return true;
        }

        tracing::info!("Access token about to expire, refreshing");
        self.api.coordinator().refresh_now().await == RefreshOutcome::Refreshed
    }
}
