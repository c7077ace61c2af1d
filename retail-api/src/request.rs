use reqwest::Method;
use retail_auth::ApiRequest;
use serde::{Serialize, de::DeserializeOwned};
use std::borrow::Cow;

use crate::error::RetailApiError;

/// Payload of an endpoint call
pub enum RequestData<T> {
    Empty,
    Query(T),
    Json(T),
}

/// A typed call against the retail REST API
pub trait Endpoint {
    type Data: Serialize;
    type Response: DeserializeOwned;

    fn method(&self) -> Method {
        Method::GET
    }

    /// Path relative to the API base url, starting with `/`
    fn endpoint(&self) -> Cow<'_, str>;

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Empty
    }
}

/// Lower a typed endpoint into the replayable request the auth client sends
pub(crate) fn build<E: Endpoint>(endpoint: &E) -> Result<ApiRequest, RetailApiError> {
    let request = ApiRequest::new(endpoint.method(), endpoint.endpoint().into_owned());

    match endpoint.data() {
        RequestData::Empty => Ok(request),
        RequestData::Json(data) => Ok(request.json(serde_json::to_value(data)?)),
        RequestData::Query(data) => query_pairs(data)?
            .into_iter()
            .try_fold(request, |req, (k, v)| Ok(req.query(k, v))),
    }
}

fn query_pairs<T: Serialize>(data: &T) -> Result<Vec<(String, String)>, RetailApiError> {
    let value = serde_json::to_value(data)?;
    let serde_json::Value::Object(map) = value else {
        return Err(RetailApiError::Query(
            "query parameters must serialize to an object".to_string(),
        ));
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => pairs.push((key, s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                return Err(RetailApiError::Query(format!(
                    "unsupported value for `{}`",
                    key
                )));
            }
            other => pairs.push((key, other.to_string())),
        }
    }
    Ok(pairs)
}
