//! End-to-end tests of the refresh-and-replay pipeline against a mock backend

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockito::{Matcher, Server, ServerGuard};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use retail_auth::{
    ApiError, ApiRequest, AuthClientError, AuthError, Authenticator, MemorySessionStorage,
    SessionEvent, SessionStorage, SessionStore, Settings, StoredSession, SESSION_EXPIRED_MESSAGE,
};
use secrecy::ExposeSecret;
use serde_json::json;

const STORES_BODY: &str = r#"[{ "id": "s-1", "name": "Downtown" }]"#;

fn stored_session(expires_at: Option<chrono::DateTime<Utc>>) -> StoredSession {
    StoredSession {
        access_token: "a1".to_string(),
        refresh_token: "r1".to_string(),
        expires_at,
        user: None,
        permissions: Default::default(),
    }
}

fn signed_in_storage() -> Arc<MemorySessionStorage> {
    Arc::new(MemorySessionStorage::with_session(stored_session(None)))
}

fn authenticator(server: &ServerGuard, storage: Arc<MemorySessionStorage>) -> Authenticator {
    let settings = Settings::for_api(server.url());
    Authenticator::new(
        SessionStore::restore(storage),
        reqwest::Client::new(),
        &settings,
    )
}

async fn mock_refresh_ok(server: &mut ServerGuard, expected_calls: usize) -> mockito::Mock {
    server
        .mock("POST", "/auth/refresh-token")
        .match_body(Matcher::Json(json!({ "refreshToken": "r1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{ "accessToken": "a2", "refreshToken": "r2", "expiresIn": 900 }"#)
        .expect(expected_calls)
        .create_async()
        .await
}

/// `GET /stores` answered with `status` for callers presenting `token`
fn stores_mock(server: &mut ServerGuard, token: &str, status: usize, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/stores")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
}

#[tokio::test]
async fn single_caller_is_replayed_after_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let expired = stores_mock(&mut server, "a1", 401, r#"{"message":"jwt expired"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = mock_refresh_ok(&mut server, 1).await;
    let replayed = stores_mock(&mut server, "a2", 200, STORES_BODY)
        .expect(1)
        .create_async()
        .await;

    let storage = signed_in_storage();
    let auth = authenticator(&server, storage.clone());

    //* When
    let response = auth
        .api()
        .send(ApiRequest::get("/stores"))
        .await
        .expect("replayed call should succeed");

    //* Then
    expired.assert_async().await;
    refresh.assert_async().await;
    replayed.assert_async().await;
    assert_eq!(response.status, StatusCode::OK);
    let stores: serde_json::Value = response.json().unwrap();
    assert_eq!(stores[0]["name"], "Downtown");

    let store = auth.store();
    assert_eq!(store.access_token().unwrap().expose_secret(), "a2");
    assert_eq!(store.refresh_token().unwrap().expose_secret(), "r2");

    let persisted = storage.load().unwrap().unwrap();
    assert_eq!(persisted.access_token, "a2");
    assert_eq!(persisted.refresh_token, "r2");
    assert!(persisted.expires_at.is_some());
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    //* Given
    let mut server = Server::new_async().await;
    let expired = stores_mock(&mut server, "a1", 401, "{}")
        .expect_at_least(1)
        .create_async()
        .await;
    let refresh = mock_refresh_ok(&mut server, 1).await;
    let replayed = stores_mock(&mut server, "a2", 200, STORES_BODY)
        .expect(5)
        .create_async()
        .await;

    let auth = authenticator(&server, signed_in_storage());

    //* When
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let api = auth.api().clone();
            tokio::spawn(async move { api.send(ApiRequest::get("/stores")).await })
        })
        .collect();

    //* Then
    for handle in handles {
        let response = handle.await.unwrap().expect("every caller should succeed");
        assert_eq!(response.status, StatusCode::OK);
    }
    expired.assert_async().await;
    refresh.assert_async().await;
    replayed.assert_async().await;
    assert_eq!(auth.api().coordinator().cycles_started(), 1);
}

#[tokio::test]
async fn failed_refresh_rejects_with_original_error() {
    //* Given
    let mut server = Server::new_async().await;
    let _expired = stores_mock(&mut server, "a1", 401, r#"{"message":"jwt expired"}"#)
        .expect_at_least(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh-token")
        .with_status(403)
        .with_body(r#"{"message":"refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;

    let storage = signed_in_storage();
    let auth = authenticator(&server, storage.clone());
    let mut events = auth.subscribe();

    //* When
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let api = auth.api().clone();
            tokio::spawn(async move { api.send(ApiRequest::get("/stores")).await })
        })
        .collect();

    //* Then
    for handle in handles {
        match handle.await.unwrap() {
            Err(ApiError::Unauthorized {
                body,
                after_refresh,
            }) => {
                assert!(body.contains("jwt expired"), "got refresh error body: {}", body);
                assert!(!after_refresh);
            }
            other => panic!("expected the original 401, got {:?}", other),
        }
    }
    refresh.assert_async().await;

    assert!(!auth.store().is_authenticated());
    assert_eq!(storage.load().unwrap(), None);

    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Expired {
            message: SESSION_EXPIRED_MESSAGE.to_string()
        }
    );
    assert!(events.try_recv().is_err(), "session expired must be announced once");
}

#[tokio::test]
async fn replayed_call_rejected_again_is_terminal() {
    //* Given
    let mut server = Server::new_async().await;
    let _expired = stores_mock(&mut server, "a1", 401, "{}")
        .expect(1)
        .create_async()
        .await;
    let refresh = mock_refresh_ok(&mut server, 1).await;
    let still_rejected = stores_mock(&mut server, "a2", 401, r#"{"message":"forbidden user"}"#)
        .expect(1)
        .create_async()
        .await;

    let auth = authenticator(&server, signed_in_storage());

    //* When
    let result = auth.api().send(ApiRequest::get("/stores")).await;

    //* Then
    match result {
        Err(ApiError::Unauthorized { after_refresh, .. }) => assert!(after_refresh),
        other => panic!("expected terminal 401, got {:?}", other),
    }
    refresh.assert_async().await;
    still_rejected.assert_async().await;
    assert_eq!(auth.api().coordinator().cycles_started(), 1);
    // The refreshed session itself is kept
    assert_eq!(auth.store().access_token().unwrap().expose_secret(), "a2");
}

#[tokio::test]
async fn missing_session_fails_without_refresh_call() {
    //* Given
    let mut server = Server::new_async().await;
    let unauthenticated = server
        .mock("GET", "/stores")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let refresh = mock_refresh_ok(&mut server, 0).await;

    let auth = authenticator(&server, Arc::new(MemorySessionStorage::new()));
    let mut events = auth.subscribe();

    //* When
    let result = auth.api().send(ApiRequest::get("/stores")).await;

    //* Then
    assert!(matches!(
        result,
        Err(ApiError::Unauthorized {
            after_refresh: false,
            ..
        })
    ));
    unauthenticated.assert_async().await;
    refresh.assert_async().await;
    assert!(events.try_recv().is_ok());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn missing_session_rejects_concurrent_callers_with_their_own_error() {
    //* Given
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for i in 0..4 {
        let mock = server
            .mock("GET", format!("/items/{}", i).as_str())
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_body(format!(r#"{{"caller":{}}}"#, i))
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }
    let refresh = mock_refresh_ok(&mut server, 0).await;

    let auth = authenticator(&server, Arc::new(MemorySessionStorage::new()));
    let mut events = auth.subscribe();

    //* When
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let api = auth.api().clone();
            tokio::spawn(async move { api.send(ApiRequest::get(format!("/items/{}", i))).await })
        })
        .collect();

    //* Then
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.await.unwrap() {
            Err(ApiError::Unauthorized {
                body,
                after_refresh,
            }) => {
                assert_eq!(body, format!(r#"{{"caller":{}}}"#, i));
                assert!(!after_refresh);
            }
            other => panic!("expected caller {}'s own 401, got {:?}", i, other),
        }
    }
    for mock in mocks {
        mock.assert_async().await;
    }
    refresh.assert_async().await;

    // One announcement per failed cycle, never one per caller of a cycle
    let cycles = auth.api().coordinator().cycles_started();
    let mut announced = 0;
    while events.try_recv().is_ok() {
        announced += 1;
    }
    assert!(cycles >= 1);
    assert_eq!(announced, cycles);
    assert!(!auth.store().is_authenticated());
}

#[tokio::test]
async fn non_auth_failures_pass_through() {
    //* Given
    let mut server = Server::new_async().await;
    let _broken = stores_mock(&mut server, "a1", 500, r#"{"message":"db down"}"#).create_async().await;
    let refresh = mock_refresh_ok(&mut server, 0).await;

    let auth = authenticator(&server, signed_in_storage());

    //* When
    let result = auth.api().send(ApiRequest::get("/stores")).await;

    //* Then
    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("db down"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    refresh.assert_async().await;
    assert!(auth.store().is_authenticated());
}

#[tokio::test]
async fn transport_errors_pass_through() {
    //* Given
    let settings = Settings::for_api("http://127.0.0.1:9");
    let auth = Authenticator::new(
        SessionStore::restore(signed_in_storage()),
        reqwest::Client::new(),
        &settings,
    );

    //* When
    let result = auth.api().send(ApiRequest::get("/stores")).await;

    //* Then
    assert!(matches!(result, Err(ApiError::Transport(_))));
    assert_eq!(auth.api().coordinator().cycles_started(), 0);
    assert!(auth.store().is_authenticated());
}

#[tokio::test]
async fn replay_preserves_the_original_request() {
    //* Given
    let mut server = Server::new_async().await;
    let _expired = server
        .mock("POST", "/items")
        .match_header("authorization", "Bearer a1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = mock_refresh_ok(&mut server, 1).await;
    let replayed = server
        .mock("POST", "/items")
        .match_header("authorization", "Bearer a2")
        .match_header("x-request-id", "req-7")
        .match_query(Matcher::UrlEncoded("storeId".into(), "s-1".into()))
        .match_body(Matcher::Json(json!({ "name": "Soap", "quantity": 3 })))
        .with_status(201)
        .with_body(r#"{ "id": "i-9" }"#)
        .expect(1)
        .create_async()
        .await;

    let auth = authenticator(&server, signed_in_storage());
    let request = ApiRequest::post("/items")
        .query("storeId", "s-1")
        .header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-7"),
        )
        .json(json!({ "name": "Soap", "quantity": 3 }));

    //* When
    let response = auth.api().send(request).await.expect("replay should succeed");

    //* Then
    assert_eq!(response.status, StatusCode::CREATED);
    refresh.assert_async().await;
    replayed.assert_async().await;
}

#[tokio::test]
async fn login_populates_the_session() {
    //* Given
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/auth/login")
        .match_body(Matcher::Json(json!({ "username": "cashier", "password": "hunter2" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "accessToken": "a1",
                "refreshToken": "r1",
                "user": { "id": "u-1", "username": "cashier" },
                "permissions": ["pos.checkout"]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let storage = Arc::new(MemorySessionStorage::new());
    let auth = authenticator(&server, storage.clone());

    //* When
    let user = auth.login("cashier", "hunter2").await.expect("login failed");

    //* Then
    login.assert_async().await;
    assert_eq!(user.username, "cashier");
    assert!(auth.store().has_permission("pos.checkout"));
    assert_eq!(storage.load().unwrap().unwrap().access_token, "a1");
}

#[tokio::test]
async fn rejected_login_never_refreshes() {
    //* Given
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/auth/login")
        .with_status(401)
        .create_async()
        .await;
    let refresh = mock_refresh_ok(&mut server, 0).await;

    let auth = authenticator(&server, Arc::new(MemorySessionStorage::new()));

    //* When
    let result = auth.login("cashier", "wrong").await;

    //* Then
    assert!(matches!(
        result,
        Err(AuthError::AuthClient(AuthClientError::InvalidCredentials))
    ));
    refresh.assert_async().await;
    assert!(!auth.store().is_authenticated());
}

#[tokio::test]
async fn logout_clears_session_even_when_server_fails() {
    //* Given
    let mut server = Server::new_async().await;
    let logout = server
        .mock("POST", "/auth/logout")
        .match_header("authorization", "Bearer a1")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let storage = signed_in_storage();
    let auth = authenticator(&server, storage.clone());

    //* When
    auth.logout().await;

    //* Then
    logout.assert_async().await;
    assert!(!auth.store().is_authenticated());
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn expiring_token_is_refreshed_ahead_of_time() {
    //* Given
    let mut server = Server::new_async().await;
    let refresh = mock_refresh_ok(&mut server, 1).await;

    let storage = Arc::new(MemorySessionStorage::with_session(stored_session(Some(
        Utc::now() + Duration::minutes(1),
    ))));
    let auth = authenticator(&server, storage);

    //* When
    let fresh = auth.ensure_fresh().await;

    //* Then
    assert!(fresh);
    refresh.assert_async().await;
    assert_eq!(auth.store().access_token().unwrap().expose_secret(), "a2");
}

#[tokio::test]
async fn valid_token_is_not_refreshed_ahead_of_time() {
    //* Given
    let mut server = Server::new_async().await;
    let refresh = mock_refresh_ok(&mut server, 0).await;

    let storage = Arc::new(MemorySessionStorage::with_session(stored_session(Some(
        Utc::now() + Duration::hours(1),
    ))));
    let auth = authenticator(&server, storage);

    //* When
    let fresh = auth.ensure_fresh().await;

    //* Then
    assert!(fresh);
    refresh.assert_async().await;
    assert_eq!(auth.store().access_token().unwrap().expose_secret(), "a1");
}
