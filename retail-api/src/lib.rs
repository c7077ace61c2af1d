pub mod endpoints;
mod error;
mod macros;
pub mod repositories;
mod request;

pub use crate::error::RetailApiError;
pub use crate::request::{Endpoint, RequestData};
use repositories::*;
use retail_auth::{AuthenticatedClient, ServerAuthClient, TokenRefresher};

/// Typed client for the retail REST API.
///
/// Calls go through the authenticated client, so an expired token is
/// refreshed and the call replayed without the caller noticing.
pub struct Client<R = ServerAuthClient> {
    inner: AuthenticatedClient<R>,
}

impl<R> Clone for Client<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: TokenRefresher> Client<R> {
    pub fn new(inner: AuthenticatedClient<R>) -> Self {
        Self { inner }
    }

    pub async fn send<E>(&self, endpoint: E) -> Result<E::Response, RetailApiError>
    where
        E: Endpoint,
    {
        let request = request::build(&endpoint)?;
        let response = self.inner.send(request).await?;
        Ok(response.json()?)
    }
}

pub struct Request;

impl Request {
    pub fn new() -> Self {
        Self {}
    }

    pub fn stores() -> StoreRepository {
        StoreRepository::new()
    }

    pub fn items() -> ItemRepository {
        ItemRepository::new()
    }

    pub fn users() -> UserRepository {
        UserRepository::new()
    }
}
