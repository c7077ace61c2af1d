use crate::client::token_storage::{MemorySessionStorage, SessionStorage};
use crate::common::{RefreshGrant, Session, StoredSession, TokenPair, UserProfile};
use crate::error::AuthError;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-wide holder of the current [`Session`].
///
/// Every mutation swaps the whole session under one write lock and writes it
/// through to storage before the lock is released, so readers see either the
/// old session or the new one and never a mix of the two.
#[derive(Clone)]
pub struct SessionStore {
    session: Arc<RwLock<Session>>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Seed the store from durable storage. An unreadable session is
    /// discarded and the store starts signed out.
    pub fn restore(storage: Arc<dyn SessionStorage>) -> Self {
        let session = match storage.load() {
            Ok(Some(stored)) => {
                tracing::info!("Restored persisted session");
                Session::from(stored)
            }
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                if let Err(e) = storage.clear() {
                    tracing::warn!("Failed to remove unreadable session: {}", e);
                }
                Session::default()
            }
        };

        Self {
            session: Arc::new(RwLock::new(session)),
            storage,
        }
    }

    pub fn in_memory() -> Self {
        Self::restore(Arc::new(MemorySessionStorage::new()))
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<SecretString> {
        self.read().access_token().cloned()
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read().refresh_token().cloned()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    pub fn permissions(&self) -> BTreeSet<String> {
        self.read().permissions.clone()
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.read().has_permission(code)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Replace the session after a successful login
    pub fn establish(&self, session: Session) -> Result<(), AuthError> {
        let mut current = self.write();
        *current = session;
        match StoredSession::from_session(&current) {
            Some(stored) => self.storage.save(&stored)?,
            None => self.storage.clear()?,
        }
        tracing::info!(
            user = current.user.as_ref().map(|u| u.username.as_str()).unwrap_or("-"),
            permissions = current.permissions.len(),
            "Session established"
        );
        Ok(())
    }

    /// Swap in refreshed credentials, keeping the current refresh token when
    /// the server did not rotate it.
    ///
    /// `sent` is the refresh token the grant was issued for. Returns false and
    /// leaves the store alone when that session is no longer the current one
    /// (signed out, or replaced by another login while the refresh was in
    /// flight).
    pub(crate) fn apply_refresh(&self, grant: RefreshGrant, sent: &SecretString) -> bool {
        let mut current = self.write();
        let Some(tokens) = current.tokens.as_ref() else {
            return false;
        };
        if tokens.refresh_token.expose_secret() != sent.expose_secret() {
            return false;
        }

        let refreshed = TokenPair {
            access_token: grant.access_token,
            refresh_token: grant
                .refresh_token
                .unwrap_or_else(|| tokens.refresh_token.clone()),
            expires_at: grant.expires_at,
        };
        current.tokens = Some(refreshed);

        if let Some(stored) = StoredSession::from_session(&current) {
            if let Err(e) = self.storage.save(&stored) {
                tracing::warn!("Failed to persist refreshed session: {}", e);
            }
        }
        tracing::debug!("Session tokens refreshed");
        true
    }

    /// Sign out after a failed refresh of the session whose refresh token
    /// was `sent` (`None` when there was none to send). A session that
    /// replaced it in the meantime is kept, and false is returned.
    pub(crate) fn expire(&self, sent: Option<&SecretString>) -> bool {
        let mut current = self.write();
        if let Some(tokens) = current.tokens.as_ref() {
            let same = sent
                .is_some_and(|s| s.expose_secret() == tokens.refresh_token.expose_secret());
            if !same {
                return false;
            }
        }
        self.reset(&mut current);
        true
    }

    /// Sign out locally. Always succeeds in memory; storage failures are logged.
    pub fn clear(&self) {
        let mut current = self.write();
        self.reset(&mut current);
    }

    fn reset(&self, current: &mut Session) {
        *current = Session::default();
        if let Err(e) = self.storage.clear() {
            tracing::warn!("Failed to remove persisted session: {}", e);
        }
        tracing::info!("Session cleared");
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
