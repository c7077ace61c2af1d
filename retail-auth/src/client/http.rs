use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::client::auth_client::ServerAuthClient;
use crate::client::classifier::{FailureClass, FailureClassifier};
use crate::client::coordinator::{RefreshCoordinator, RefreshOutcome, TokenRefresher};
use crate::client::interceptor::Interceptor;
use crate::client::replay;
use crate::client::request::{ApiRequest, ApiResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed ({status}): {body}")]
    Status { status: StatusCode, body: String },

    /// The server refused the credentials. `after_refresh` is set when the
    /// call had already been replayed with a refreshed token.
    #[error("Not authorized: {body}")]
    Unauthorized { body: String, after_refresh: bool },

    #[error("Failed to decode response: {0}")]
    Decode(serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Transport(e) => e.status(),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    fn unauthorized(response: &ApiResponse, after_refresh: bool) -> Self {
        ApiError::Unauthorized {
            body: response.text(),
            after_refresh,
        }
    }
}

/// HTTP client for the retail REST API that keeps the caller signed in.
///
/// Each call is stamped with the current access token. A first 401 parks
/// the call on the [`RefreshCoordinator`] and replays it once the token is
/// refreshed; a second 401 on the replay is returned as is.
pub struct AuthenticatedClient<R = ServerAuthClient> {
    http_client: Client,
    base_url: String,
    interceptor: Interceptor,
    classifier: FailureClassifier,
    coordinator: RefreshCoordinator<R>,
}

impl<R> Clone for AuthenticatedClient<R> {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            interceptor: self.interceptor.clone(),
            classifier: self.classifier.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<R: TokenRefresher> AuthenticatedClient<R> {
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        interceptor: Interceptor,
        classifier: FailureClassifier,
        coordinator: RefreshCoordinator<R>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            interceptor,
            classifier,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator<R> {
        &self.coordinator
    }

    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        loop {
            let response = self.dispatch(&mut request).await?;

            match self.classifier.classify(&mut request, response.status) {
                FailureClass::NotAuthFailure => return into_result(response),
                FailureClass::AlreadyRetried => {
                    tracing::warn!(
                        path = %request.path,
                        "Refreshed token rejected, giving up"
                    );
                    return Err(ApiError::unauthorized(&response, true));
                }
                FailureClass::FirstAttempt => {
                    let original = ApiError::unauthorized(&response, false);
                    let sent_with = request.bearer_token().map(str::to_string);

                    match self.coordinator.acquire(sent_with.as_deref()).await {
                        RefreshOutcome::Refreshed => request = replay::prepare(request),
                        RefreshOutcome::Failed => return Err(original),
                    }
                }
            }
        }
    }

    async fn dispatch(&self, request: &mut ApiRequest) -> Result<ApiResponse, ApiError> {
        self.interceptor.intercept(request);

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        tracing::debug!(method = %request.method, path = %request.path, %status, "Request completed");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: response.status,
            body: response.text(),
        })
    }
}
