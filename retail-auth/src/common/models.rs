use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identity of the signed-in user as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Access and refresh credentials, always held together
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The authenticated context of the process.
///
/// A session is either fully signed out (`Session::default()`) or carries a
/// token pair. `user` and `permissions` only mean something while tokens are
/// present.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub tokens: Option<TokenPair>,
    pub user: Option<UserProfile>,
    pub permissions: BTreeSet<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.tokens.as_ref().map(|t| &t.access_token)
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.tokens.as_ref().map(|t| &t.refresh_token)
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.is_authenticated() && self.permissions.contains(code)
    }

    /// True when the access token expires within `buffer` of `now`.
    /// Tokens without a known expiry never count as expiring.
    pub fn is_expiring(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        match self.tokens.as_ref().and_then(|t| t.expires_at) {
            Some(expires_at) => expires_at <= now + buffer,
            None => false,
        }
    }
}

/// On-disk form of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl StoredSession {
    /// Returns `None` for a signed-out session, which is never persisted.
    pub fn from_session(session: &Session) -> Option<Self> {
        let tokens = session.tokens.as_ref()?;
        Some(Self {
            access_token: tokens.access_token.expose_secret().to_string(),
            refresh_token: tokens.refresh_token.expose_secret().to_string(),
            expires_at: tokens.expires_at,
            user: session.user.clone(),
            permissions: session.permissions.clone(),
        })
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            tokens: Some(TokenPair {
                access_token: SecretString::from(stored.access_token),
                refresh_token: SecretString::from(stored.refresh_token),
                expires_at: stored.expires_at,
            }),
            user: stored.user,
            permissions: stored.permissions,
        }
    }
}

/// Body returned by the login endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Self {
            tokens: Some(TokenPair {
                access_token: SecretString::from(resp.access_token),
                refresh_token: SecretString::from(resp.refresh_token),
                expires_at: expiry_from_now(resp.expires_in),
            }),
            user: Some(resp.user),
            permissions: resp.permissions,
        }
    }
}

/// Credentials issued by a successful refresh.
/// The refresh token is only present when the server rotates it.
#[derive(Clone)]
pub struct RefreshGrant {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for RefreshGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshGrant")
            .field("rotated", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) fn expiry_from_now(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
}
