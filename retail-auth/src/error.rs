use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session storage error: {0}")]
    SessionStorage(String),

    #[error("Malformed session data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Auth error: {0}")]
    AuthClient(#[from] crate::client::auth_client::AuthClientError),
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
