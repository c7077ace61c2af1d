use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::oneshot;

use crate::client::auth_client::AuthClientError;
use crate::client::notifier::SessionNotifier;
use crate::client::session_store::SessionStore;
use crate::common::RefreshGrant;

/// Exchanges a refresh token for new credentials.
///
/// Implemented by [`ServerAuthClient`](crate::ServerAuthClient); tests swap
/// in scripted refreshers.
pub trait TokenRefresher: Send + Sync + 'static {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshGrant, AuthClientError>> + Send;
}

impl<T: TokenRefresher> TokenRefresher for Arc<T> {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshGrant, AuthClientError>> + Send {
        (**self).refresh(refresh_token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The store holds a newer access token; replay the call
    Refreshed,
    /// The session is gone; the caller fails with its original error
    Failed,
}

struct Waiter {
    ticket: u64,
    sender: oneshot::Sender<RefreshOutcome>,
}

/// Callers parked on the refresh that is in flight
#[derive(Default)]
struct RefreshCycle {
    waiters: VecDeque<Waiter>,
}

impl RefreshCycle {
    fn join(&mut self, ticket: u64) -> oneshot::Receiver<RefreshOutcome> {
        let (sender, receiver) = oneshot::channel();
        self.waiters.push_back(Waiter { ticket, sender });
        receiver
    }

    /// Release every waiter in join order. Consumes the cycle, so a waiter
    /// can't be released twice.
    fn release(self, outcome: RefreshOutcome) -> Vec<u64> {
        let mut released = Vec::with_capacity(self.waiters.len());
        for waiter in self.waiters {
            // A waiter whose caller went away has nobody left to tell
            if waiter.sender.send(outcome).is_err() {
                tracing::debug!(ticket = waiter.ticket, "Refresh waiter dropped before release");
            }
            released.push(waiter.ticket);
        }
        released
    }
}

#[derive(Default)]
struct CoordinatorState {
    /// `None` while idle
    cycle: Option<RefreshCycle>,
    next_ticket: u64,
    cycles_started: u64,
}

struct Inner<R> {
    store: SessionStore,
    refresher: R,
    notifier: Arc<dyn SessionNotifier>,
    refresh_timeout: Duration,
    state: Mutex<CoordinatorState>,
}

/// Single-flight guard around the token refresh.
///
/// However many calls fail with a 401 at once, one refresh request goes out.
/// The caller that finds the coordinator idle starts a cycle; everyone else
/// queues behind it. When the refresh concludes the session store is updated
/// (or cleared) first, then all waiters are released in the order they
/// joined. A failed cycle tells the [`SessionNotifier`] exactly once.
pub struct RefreshCoordinator<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for RefreshCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TokenRefresher> RefreshCoordinator<R> {
    pub fn new(
        store: SessionStore,
        refresher: R,
        notifier: Arc<dyn SessionNotifier>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                refresher,
                notifier,
                refresh_timeout,
                state: Mutex::new(CoordinatorState::default()),
            }),
        }
    }

    /// Wait for a usable token after a call sent with `sent_with` got a 401.
    ///
    /// When idle, the store is checked first: a different token means a
    /// previous cycle already rotated it, and an empty store means the
    /// session already ended. Neither starts a new refresh.
    pub async fn acquire(&self, sent_with: Option<&str>) -> RefreshOutcome {
        let receiver = {
            let mut state = self.inner.lock();
            if state.cycle.is_none() {
                match (sent_with, self.inner.store.access_token()) {
                    (Some(sent), Some(current)) if sent != current.expose_secret() => {
                        tracing::debug!("Access token already rotated, skipping refresh");
                        return RefreshOutcome::Refreshed;
                    }
                    (Some(_), None) => {
                        tracing::debug!("Session already ended, skipping refresh");
                        return RefreshOutcome::Failed;
                    }
                    _ => {}
                }
            }
            self.join(&mut state)
        };

        receiver.await.unwrap_or(RefreshOutcome::Failed)
    }

    /// Refresh now, or join the refresh already in flight
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let receiver = {
            let mut state = self.inner.lock();
            self.join(&mut state)
        };

        receiver.await.unwrap_or(RefreshOutcome::Failed)
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.lock().cycle.is_some()
    }

    /// Callers parked on the current cycle, including the one that started it
    pub fn queued(&self) -> usize {
        self.inner
            .lock()
            .cycle
            .as_ref()
            .map(|c| c.waiters.len())
            .unwrap_or(0)
    }

    pub fn cycles_started(&self) -> u64 {
        self.inner.lock().cycles_started
    }

    fn join(&self, state: &mut CoordinatorState) -> oneshot::Receiver<RefreshOutcome> {
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        if let Some(cycle) = state.cycle.as_mut() {
            let receiver = cycle.join(ticket);
            tracing::debug!(
                ticket,
                queued = cycle.waiters.len(),
                "Joined in-flight token refresh"
            );
            return receiver;
        }

        let mut cycle = RefreshCycle::default();
        let receiver = cycle.join(ticket);
        state.cycle = Some(cycle);
        state.cycles_started += 1;
        tracing::info!(ticket, "Starting token refresh");

        // The cycle runs on its own task so it concludes even if the caller
        // that started it is dropped.
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.run_cycle());

        receiver
    }
}

impl<R: TokenRefresher> Inner<R> {
    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_cycle(self: Arc<Self>) {
        let mut task = CycleTask {
            inner: self,
            concluded: false,
        };
        // The grant and the failure both apply only to the session this
        // refresh token belongs to.
        let sent = task.inner.store.refresh_token();
        let result = task.inner.refresh(sent.as_ref()).await;
        task.inner.conclude(sent.as_ref(), result);
        task.concluded = true;
    }

    async fn refresh(
        &self,
        refresh_token: Option<&SecretString>,
    ) -> Result<RefreshGrant, AuthClientError> {
        let Some(refresh_token) = refresh_token else {
            return Err(AuthClientError::MissingRefreshToken);
        };

        let call = self.refresher.refresh(refresh_token.expose_secret());
        match tokio::time::timeout(self.refresh_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AuthClientError::Timeout(self.refresh_timeout)),
        }
    }

    fn conclude(
        &self,
        sent: Option<&SecretString>,
        result: Result<RefreshGrant, AuthClientError>,
    ) {
        let mut expired = false;

        // Store write and return to idle happen under the same lock, so a
        // late 401 sees either the old cycle or the new token. The store
        // persists synchronously here; the session file is a few hundred
        // bytes.
        let (outcome, cycle) = {
            let mut state = self.lock();
            let outcome = match (result, sent) {
                (Ok(grant), Some(sent)) => {
                    if self.store.apply_refresh(grant, sent) {
                        RefreshOutcome::Refreshed
                    } else {
                        tracing::info!(
                            "Session ended or replaced while refreshing, dropping new token"
                        );
                        RefreshOutcome::Failed
                    }
                }
                (Ok(_), None) => RefreshOutcome::Failed,
                (Err(AuthClientError::Interrupted), _) => {
                    tracing::warn!("Token refresh interrupted, keeping session as is");
                    RefreshOutcome::Failed
                }
                (Err(e), sent) => {
                    tracing::warn!("Token refresh failed: {}", e);
                    if self.store.expire(sent) {
                        expired = true;
                    } else {
                        tracing::info!("Session replaced while refreshing, keeping it");
                    }
                    RefreshOutcome::Failed
                }
            };
            (outcome, state.cycle.take().unwrap_or_default())
        };

        if expired {
            self.notifier.session_expired();
        }

        let released = cycle.release(outcome);
        tracing::info!(
            ?outcome,
            released = released.len(),
            "Token refresh concluded"
        );
    }
}

/// Releases the waiters if the cycle task stops before concluding (panic,
/// runtime shutdown), so no caller is left parked. The session is left alone
/// since the refresh may or may not have reached the server.
struct CycleTask<R: TokenRefresher> {
    inner: Arc<Inner<R>>,
    concluded: bool,
}

impl<R: TokenRefresher> Drop for CycleTask<R> {
    fn drop(&mut self) {
        if !self.concluded {
            self.inner.conclude(None, Err(AuthClientError::Interrupted));
        }
    }
}
