mod models;

use crate::client::config::Settings;
use crate::client::coordinator::TokenRefresher;
use crate::common::{expiry_from_now, LoginResponse, RefreshGrant};
pub use models::AuthClientError;
use models::*;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;

/// Talks to the login, refresh and logout endpoints of the retail backend.
///
/// These calls go out on their own and never pass through the
/// authenticated pipeline, so a 401 from them can't start a refresh.
#[derive(Clone)]
pub struct ServerAuthClient {
    http_client: Client,
    api_url: String,
    login_path: String,
    refresh_path: String,
    logout_path: String,
}

impl ServerAuthClient {
    pub fn new(settings: &Settings) -> Result<Self, AuthClientError> {
        let http_client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self::with_client(http_client, settings))
    }

    pub fn with_client(http_client: Client, settings: &Settings) -> Self {
        Self {
            http_client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            login_path: settings.login_path.clone(),
            refresh_path: settings.refresh_path.clone(),
            logout_path: settings.logout_path.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthClientError> {
        let req = LoginRequest { username, password };

        let resp = self
            .http_client
            .post(self.url(&self.login_path))
            .json(&req)
            .send()
            .await?;

        match resp.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(AuthClientError::InvalidCredentials)
            }
            status if !status.is_success() => return Err(AuthClientError::Rejected(status)),
            _ => {}
        }

        Ok(resp.json::<LoginResponse>().await?)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshGrant, AuthClientError> {
        let req = RefreshRequest { refresh_token };

        let resp = self
            .http_client
            .post(self.url(&self.refresh_path))
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuthClientError::Rejected(resp.status()));
        }

        let resp = resp.json::<RefreshResponse>().await?;

        Ok(RefreshGrant {
            access_token: SecretString::from(resp.access_token),
            refresh_token: resp.refresh_token.map(SecretString::from),
            expires_at: expiry_from_now(resp.expires_in),
        })
    }

    /// Tell the server the session is over
    pub async fn logout(&self, access_token: Option<&SecretString>) -> Result<(), AuthClientError> {
        let mut req = self.http_client.post(self.url(&self.logout_path));
        if let Some(token) = access_token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(AuthClientError::Rejected(resp.status()));
        }
        Ok(())
    }
}

impl TokenRefresher for ServerAuthClient {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshGrant, AuthClientError>> + Send {
        self.refresh_token(refresh_token)
    }
}
