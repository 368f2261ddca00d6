//! # Session store — who is acting, and with what tier
//!
//! [`SessionStore`] is the single source of truth for the current identity and
//! its [`Tier`]. It moves through
//!
//! ```text
//! Loading ──▶ Anonymous
//!    │            ▲ │
//!    ▼            │ ▼
//!   Authenticated(profile | unknown)
//! ```
//!
//! Reading the state ([`SessionStore::get_session`]) never touches the network.
//!
//! ## Lifecycle
//!
//! The store follows the backend's session feed through a listener that the
//! application owns: [`SessionStore::start`] hands out the listener future once,
//! the app spawns it at bootstrap, and [`SessionStore::stop`] aborts it at
//! shutdown, which also releases the subscription. The listener first resolves
//! the session the backend already holds, then follows sign-in, refresh and
//! sign-out events, including ones that did not go through this store (expired
//! tokens, sign-out in another tab).
//!
//! ## Profiles
//!
//! Becoming `Authenticated` means loading the identity's profile row. When
//! that fetch fails the identity is still reported, with an unknown tier that
//! every privilege check treats as `free`. Each resolution takes a fresh
//! epoch; a profile response that arrives after a newer resolution started
//! is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{abortable, AbortHandle};
use store::{
    fetch_one, AuthBackend, AuthError, AuthSession, Credentials, Identity, Profile, RemoteStore,
    Tier,
};
use tokio::sync::watch;

/// A signed-in identity and, when it could be loaded, its profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub profile: Option<Profile>,
}

impl Session {
    /// The profile's tier; `None` when the profile could not be loaded.
    pub fn tier(&self) -> Option<Tier> {
        self.profile.as_ref().map(|p| p.tier)
    }

    /// Tier used for privilege checks. Unknown counts as free.
    pub fn effective_tier(&self) -> Tier {
        self.tier().unwrap_or(Tier::Free)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Loading,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session().map(|s| &s.identity)
    }

    /// Tier used for privilege checks. Anyone not signed in is free.
    pub fn effective_tier(&self) -> Tier {
        self.session()
            .map(Session::effective_tier)
            .unwrap_or(Tier::Free)
    }

    pub fn is_admin(&self) -> bool {
        self.effective_tier().is_admin()
    }
}

#[derive(Debug)]
enum Lifecycle {
    Idle,
    Running(AbortHandle),
    Stopped,
}

#[derive(Debug)]
struct SessionInner<B> {
    backend: Option<B>,
    state: watch::Sender<SessionState>,
    lifecycle: Mutex<Lifecycle>,
    epoch: AtomicU64,
}

/// Shared handle to the session store.
#[derive(Debug)]
pub struct SessionStore<B> {
    inner: Arc<SessionInner<B>>,
}

impl<B> Clone for SessionStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B> SessionStore<B>
where
    B: AuthBackend + RemoteStore + 'static,
{
    /// Create the store. Without a backend the session is anonymous from the
    /// start and every auth operation reports the backend as unavailable.
    pub fn new(backend: Option<B>) -> Self {
        let initial = if backend.is_some() {
            SessionState::Loading
        } else {
            SessionState::Anonymous
        };
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(SessionInner {
                backend,
                state,
                lifecycle: Mutex::new(Lifecycle::Idle),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn backend(&self) -> Option<&B> {
        self.inner.backend.as_ref()
    }

    /// Last known state. No network call.
    pub fn get_session(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand out the session listener. Returns `None` if the store was already
    /// started or stopped.
    pub fn start(&self) -> Option<impl Future<Output = ()> + 'static> {
        let mut lifecycle = self.lifecycle();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            tracing::warn!("Session listener already started");
            return None;
        }

        // Subscribe before resolving the initial session so no event is missed.
        let subscription = self.backend().map(|backend| backend.subscribe());
        let store = self.clone();
        let listen = async move {
            let (Some(backend), Some(mut subscription)) = (store.backend(), subscription) else {
                return;
            };
            let initial = match backend.get_session().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Could not restore session: {}", e);
                    None
                }
            };
            store.resolve(initial).await;

            while let Some(event) = subscription.next().await {
                tracing::debug!("Auth event: {:?}", event);
                store.resolve(event.session().cloned()).await;
            }
            subscription.unsubscribe();
        };

        let (listener, handle) = abortable(listen);
        *lifecycle = Lifecycle::Running(handle);
        tracing::debug!("Session listener started");
        Some(async move {
            if listener.await.is_err() {
                tracing::debug!("Session listener stopped");
            }
        })
    }

    /// Tear the listener down. Returns `true` only for the first call.
    pub fn stop(&self) -> bool {
        match std::mem::replace(&mut *self.lifecycle(), Lifecycle::Stopped) {
            Lifecycle::Running(handle) => {
                handle.abort();
                true
            }
            Lifecycle::Idle => true,
            Lifecycle::Stopped => {
                tracing::debug!("Session store already stopped");
                false
            }
        }
    }

    fn next_epoch(&self) -> u64 {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, epoch: u64, state: SessionState) {
        if self.inner.epoch.load(Ordering::SeqCst) == epoch {
            self.inner.state.send_replace(state);
        } else {
            tracing::debug!("Dropping stale session resolution {}", epoch);
        }
    }

    async fn fetch_profile(&self, id: &str) -> Option<Profile> {
        let backend = self.backend()?;
        match fetch_one::<Profile>(backend, &id.to_string()).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::error!("Error fetching profile: {}", e);
                None
            }
        }
    }

    async fn authenticate(&self, auth: AuthSession) -> Session {
        let epoch = self.next_epoch();
        let profile = self.fetch_profile(&auth.identity.id).await;
        let session = Session {
            identity: auth.identity,
            profile,
        };
        self.publish(epoch, SessionState::Authenticated(session.clone()));
        session
    }

    async fn resolve(&self, auth: Option<AuthSession>) {
        match auth {
            Some(auth) => {
                self.authenticate(auth).await;
            }
            None => {
                let epoch = self.next_epoch();
                self.publish(epoch, SessionState::Anonymous);
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let backend = self.backend().ok_or(AuthError::BackendUnavailable)?;
        let auth = backend
            .sign_in_with_password(&Credentials::new(email, password))
            .await?;
        tracing::info!("Signed in as {}", auth.identity.email);
        Ok(self.authenticate(auth).await)
    }

    /// Create an account. Whether it is usable right away is the backend's
    /// call; if it signs the user in, the listener picks that up.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let backend = self.backend().ok_or(AuthError::BackendUnavailable)?;
        backend
            .sign_up(&Credentials::new(email, password))
            .await
            .map(|outcome| tracing::info!("Sign-up for {}: {:?}", email, outcome))
    }

    /// Sign out. Local state is cleared even if the backend call fails.
    pub async fn sign_out(&self) {
        let epoch = self.next_epoch();
        self.publish(epoch, SessionState::Anonymous);
        if let Some(backend) = self.backend() {
            if let Err(e) = backend.sign_out().await {
                tracing::warn!("Remote sign-out failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{DataError, MemoryStore, Op};
    use tokio::task::LocalSet;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_without_backend_everything_is_unavailable() {
        let store: SessionStore<MemoryStore> = SessionStore::new(None);
        assert_eq!(store.get_session(), SessionState::Anonymous);
        assert_eq!(
            store.sign_in("a@b.c", "pw").await.unwrap_err(),
            AuthError::BackendUnavailable
        );
        assert_eq!(
            store.sign_up("a@b.c", "pw").await.unwrap_err(),
            AuthError::BackendUnavailable
        );
        store.sign_out().await;
        assert_eq!(store.get_session(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile_tier() {
        let backend = MemoryStore::new();
        backend.add_user("admin@example.com", "pw", Tier::Admin);
        let store = SessionStore::new(Some(backend));

        let session = store.sign_in("admin@example.com", "pw").await.unwrap();
        assert_eq!(session.tier(), Some(Tier::Admin));
        assert!(store.get_session().is_admin());
        assert_eq!(
            store.get_session().identity().map(|i| i.email.as_str()),
            Some("admin@example.com")
        );
    }

    #[tokio::test]
    async fn test_invalid_credentials_leave_state_alone() {
        let backend = MemoryStore::new();
        backend.add_user("ada@example.com", "pw", Tier::Free);
        let store = SessionStore::new(Some(backend));

        let err = store.sign_in("ada@example.com", "nope").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(store.get_session(), SessionState::Loading);
    }

    #[tokio::test]
    async fn test_failed_profile_fetch_fails_closed() {
        let backend = MemoryStore::new();
        backend.add_user("admin@example.com", "pw", Tier::Admin);
        backend.fail_next(Op::Select, DataError::Network("timeout".to_string()));
        let store = SessionStore::new(Some(backend));

        let session = store.sign_in("admin@example.com", "pw").await.unwrap();
        assert_eq!(session.tier(), None);
        assert_eq!(session.effective_tier(), Tier::Free);
        let state = store.get_session();
        assert!(state.identity().is_some());
        assert!(!state.is_admin());
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_remote_fails() {
        let backend = MemoryStore::new();
        backend.add_user("ada@example.com", "pw", Tier::Paid);
        let store = SessionStore::new(Some(backend.clone()));
        store.sign_in("ada@example.com", "pw").await.unwrap();

        backend.fail_next_auth(AuthError::Network("offline".to_string()));
        store.sign_out().await;
        assert_eq!(store.get_session(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_up_does_not_authenticate() {
        let backend = MemoryStore::new();
        let store = SessionStore::new(Some(backend));
        store.sign_up("new@example.com", "pw").await.unwrap();
        assert!(store.get_session().session().is_none());
    }

    #[tokio::test]
    async fn test_auto_confirmed_sign_up_still_does_not_authenticate() {
        let backend = MemoryStore::new();
        backend.set_auto_confirm(true);
        let store = SessionStore::new(Some(backend.clone()));

        store.sign_up("new@example.com", "pw").await.unwrap();
        assert!(backend.get_session().await.unwrap().is_some());
        assert!(store.get_session().session().is_none());
        assert!(!store.get_session().is_admin());
    }

    #[tokio::test]
    async fn test_listener_restores_existing_session() {
        let backend = MemoryStore::new();
        backend.add_user("ada@example.com", "pw", Tier::Paid);
        backend
            .sign_in_with_password(&Credentials::new("ada@example.com", "pw"))
            .await
            .unwrap();
        let store = SessionStore::new(Some(backend));

        LocalSet::new()
            .run_until(async {
                tokio::task::spawn_local(store.start().unwrap());
                let mut rx = store.subscribe();
                rx.wait_for(|s| !s.is_loading()).await.unwrap();
                assert_eq!(store.get_session().effective_tier(), Tier::Paid);
                assert!(store.stop());
            })
            .await;
    }

    #[tokio::test]
    async fn test_listener_follows_out_of_band_changes() {
        let backend = MemoryStore::new();
        backend.add_user("ada@example.com", "pw", Tier::Free);
        let store = SessionStore::new(Some(backend.clone()));

        LocalSet::new()
            .run_until(async {
                tokio::task::spawn_local(store.start().unwrap());
                let mut rx = store.subscribe();
                rx.wait_for(|s| *s == SessionState::Anonymous).await.unwrap();

                // Signed in somewhere else, then the token expires.
                backend
                    .sign_in_with_password(&Credentials::new("ada@example.com", "pw"))
                    .await
                    .unwrap();
                rx.wait_for(|s| s.session().is_some()).await.unwrap();

                backend.expire_session();
                rx.wait_for(|s| *s == SessionState::Anonymous).await.unwrap();
                store.stop();
            })
            .await;
    }

    #[tokio::test]
    async fn test_start_and_stop_happen_once() {
        let backend = MemoryStore::new();
        backend.add_user("ada@example.com", "pw", Tier::Free);
        let store = SessionStore::new(Some(backend.clone()));

        LocalSet::new()
            .run_until(async {
                tokio::task::spawn_local(store.start().unwrap());
                assert!(store.start().is_none());
                settle().await;
                assert_eq!(store.get_session(), SessionState::Anonymous);

                assert!(store.stop());
                assert!(!store.stop());
                settle().await;

                // Events after teardown are not observed.
                backend
                    .sign_in_with_password(&Credentials::new("ada@example.com", "pw"))
                    .await
                    .unwrap();
                settle().await;
                assert_eq!(store.get_session(), SessionState::Anonymous);
                assert!(store.start().is_none());
            })
            .await;
    }
}
