//! # API crate — hosted backend client for the portfolio
//!
//! The browser app keeps no server of its own. Rows and accounts live in a
//! hosted Supabase project, and this crate is the only code that speaks its
//! HTTP dialects.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`rest`] | [`store::RemoteStore`] over the PostgREST row API (`/rest/v1`): URL building, status mapping. |
//! | [`auth`] | [`store::AuthBackend`] over the GoTrue API (`/auth/v1`): sign up, password grant, refresh, logout, session persistence. |
//!
//! ## Construction
//!
//! [`SupabaseClient::connect`] returns `None` when the configuration lacks a
//! url or key. Callers treat that as "backend unavailable" rather than an
//! error, so the public pages keep working without a project.
//!
//! The client is cheap to clone; clones share the HTTP connection pool, the
//! current session and the auth event channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::{AuthEvent, BackendConfig};
use tokio::sync::broadcast;

pub mod auth;
pub mod rest;

use auth::StoredSession;

/// Client for one hosted project.
#[derive(Clone, Debug)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Arc<Mutex<Option<StoredSession>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Build a client, or `None` when the backend is not configured.
    pub fn connect(config: &BackendConfig) -> Option<Self> {
        if !config.is_configured() {
            tracing::warn!("Backend url or anon key missing; running without a backend");
            return None;
        }
        let (events, _) = broadcast::channel(16);
        Some(Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            anon_key: config.anon_key.trim().to_string(),
            session: Arc::new(Mutex::new(auth::storage::load())),
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<StoredSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bearer token for row requests: the user's token when signed in, the
    /// anon key otherwise.
    fn bearer(&self) -> String {
        self.lock_session()
            .as_ref()
            .map(|stored| stored.session.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    fn set_session(&self, stored: Option<StoredSession>) {
        auth::storage::save(stored.as_ref());
        *self.lock_session() = stored;
    }

    fn emit(&self, event: AuthEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    /// Forget a session the server no longer accepts and tell subscribers.
    fn expire_session(&self) {
        let had_session = self.lock_session().is_some();
        if had_session {
            tracing::info!("Access token rejected; clearing session");
            self.set_session(None);
            self.emit(AuthEvent::SignedOut);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_url_and_key() {
        assert!(SupabaseClient::connect(&BackendConfig::default()).is_none());
        assert!(SupabaseClient::connect(&BackendConfig::new("https://x.supabase.co", "")).is_none());

        let client =
            SupabaseClient::connect(&BackendConfig::new("https://x.supabase.co/", "anon")).unwrap();
        assert_eq!(client.base_url(), "https://x.supabase.co");
        assert_eq!(client.bearer(), "anon");
    }
}
