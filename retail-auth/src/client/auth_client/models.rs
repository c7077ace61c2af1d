use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug)]
pub enum AuthClientError {
    Http(reqwest::Error),
    Rejected(StatusCode),
    InvalidCredentials,
    MissingRefreshToken,
    Timeout(std::time::Duration),
    Interrupted,
}

impl std::fmt::Display for AuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Rejected(status) => write!(f, "Server rejected the request ({})", status),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::MissingRefreshToken => write!(f, "No refresh token available"),
            Self::Timeout(after) => write!(f, "Refresh timed out after {:?}", after),
            Self::Interrupted => write!(f, "Refresh was interrupted before it finished"),
        }
    }
}

impl std::error::Error for AuthClientError {}

impl From<reqwest::Error> for AuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}
