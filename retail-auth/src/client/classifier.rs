use reqwest::StatusCode;

use crate::client::request::ApiRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    NotAuthFailure,
    /// 401 on a call that has not been replayed yet; eligible for refresh
    FirstAttempt,
    /// 401 again after a replay with a refreshed token; terminal
    AlreadyRetried,
}

/// Decides whether a failed call should go to the refresh coordinator
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    auth_paths: Vec<String>,
}

impl FailureClassifier {
    /// `auth_paths` are the login and refresh endpoints, whose 401s are
    /// ordinary failures.
    pub fn new(auth_paths: Vec<String>) -> Self {
        Self { auth_paths }
    }

    /// Marks the request as retried when it returns
    /// [`FailureClass::FirstAttempt`], so a second 401 is terminal.
    pub fn classify(&self, request: &mut ApiRequest, status: StatusCode) -> FailureClass {
        if status != StatusCode::UNAUTHORIZED || self.is_auth_call(request) {
            return FailureClass::NotAuthFailure;
        }

        if request.is_retried() {
            return FailureClass::AlreadyRetried;
        }

        request.mark_retried();
        FailureClass::FirstAttempt
    }

    fn is_auth_call(&self, request: &ApiRequest) -> bool {
        self.auth_paths.iter().any(|p| p == &request.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FailureClassifier {
        FailureClassifier::new(vec!["/auth/login".into(), "/auth/refresh-token".into()])
    }

    #[test]
    fn test_non_401_is_not_auth_failure() {
        let mut request = ApiRequest::get("/stores");
        for status in [
            StatusCode::OK,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert_eq!(
                classifier().classify(&mut request, status),
                FailureClass::NotAuthFailure
            );
        }
        assert!(!request.is_retried());
    }

    #[test]
    fn test_first_401_marks_retried() {
        let mut request = ApiRequest::get("/stores");

        assert_eq!(
            classifier().classify(&mut request, StatusCode::UNAUTHORIZED),
            FailureClass::FirstAttempt
        );
        assert!(request.is_retried());

        assert_eq!(
            classifier().classify(&mut request, StatusCode::UNAUTHORIZED),
            FailureClass::AlreadyRetried
        );
    }

    #[test]
    fn test_auth_endpoints_never_refresh() {
        let mut request = ApiRequest::post("/auth/refresh-token");
        assert_eq!(
            classifier().classify(&mut request, StatusCode::UNAUTHORIZED),
            FailureClass::NotAuthFailure
        );

        let mut request = ApiRequest::post("/auth/login");
        assert_eq!(
            classifier().classify(&mut request, StatusCode::UNAUTHORIZED),
            FailureClass::NotAuthFailure
        );
        assert!(!request.is_retried());
    }
}
