use reqwest::header::AUTHORIZATION;

use crate::client::request::ApiRequest;

/// Ready a call that waited on a refresh to be sent again.
///
/// Only the Authorization header is dropped; the interceptor stamps the new
/// token on the way out. Method, path, query, body, the remaining headers
/// and the retried mark carry over untouched.
pub fn prepare(mut request: ApiRequest) -> ApiRequest {
    request.headers.remove(AUTHORIZATION);
    tracing::debug!(method = %request.method, path = %request.path, "Replaying request");
    request
}
