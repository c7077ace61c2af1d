use reqwest::header::{HeaderValue, AUTHORIZATION};
use secrecy::ExposeSecret;

use crate::client::request::ApiRequest;
use crate::client::session_store::SessionStore;

/// Stamps outbound requests with the current access token
#[derive(Clone)]
pub struct Interceptor {
    store: SessionStore,
}

impl Interceptor {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Without a token the request goes out unauthenticated and the server's
    /// 401 takes the normal failure path.
    pub fn intercept(&self, request: &mut ApiRequest) {
        let bearer = self.store.access_token().and_then(|token| {
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map(|mut value| {
                    value.set_sensitive(true);
                    value
                })
                .ok()
        });

        match bearer {
            Some(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            None => {
                request.headers.remove(AUTHORIZATION);
            }
        }
    }
}
