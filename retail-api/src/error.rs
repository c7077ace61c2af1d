use retail_auth::ApiError;

#[derive(Debug)]
pub enum RetailApiError {
    Api(ApiError),
    Encode(serde_json::Error),
    Query(String),
}

impl From<ApiError> for RetailApiError {
    fn from(value: ApiError) -> Self {
        RetailApiError::Api(value)
    }
}

impl From<serde_json::Error> for RetailApiError {
    fn from(value: serde_json::Error) -> Self {
        RetailApiError::Encode(value)
    }
}

impl RetailApiError {
    /// True when the caller has to sign in again
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RetailApiError::Api(e) if e.is_unauthorized())
    }
}

impl std::fmt::Display for RetailApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetailApiError::Api(e) => write!(f, "{}", e),
            RetailApiError::Encode(e) => write!(f, "Failed to encode request: {}", e),
            RetailApiError::Query(msg) => write!(f, "Invalid query: {}", msg),
        }
    }
}

impl std::error::Error for RetailApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetailApiError::Api(e) => Some(e),
            RetailApiError::Encode(e) => Some(e),
            RetailApiError::Query(_) => None,
        }
    }
}
