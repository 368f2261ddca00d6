//! # Collaborator contracts — row storage and authentication
//!
//! The client core never talks HTTP directly. It depends on two async traits
//! that a hosted backend client (`api::SupabaseClient`) or the in-memory
//! [`crate::MemoryStore`] implement:
//!
//! | Trait | Operations |
//! |-------|-----------|
//! | [`RemoteStore`] | `select` / `insert` / `update` / `delete` over JSON rows. |
//! | [`AuthBackend`] | `sign_up`, `sign_in_with_password`, `sign_out`, `get_session`, `subscribe`. |
//!
//! The [`Resource`] trait ties a typed row (`Project`, `Profile`) to its table,
//! its id column, and the bodies sent on insert and update. [`fetch_all`] and
//! [`fetch_one`] decode rows through it.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{AuthError, DataError};
use crate::models::{AuthSession, Credentials};
use crate::query::{Filter, Order, Query};

/// A typed row kept in a server-owned collection.
pub trait Resource: Clone + Debug + PartialEq + Serialize + DeserializeOwned + 'static {
    /// Unique key, stored in the `id` column.
    type Id: Clone + Debug + Display + Eq + Hash + Serialize + 'static;
    /// Insert body; the backend assigns the id.
    type Draft: Serialize;
    /// Update body.
    type Patch: Clone + Serialize;

    const TABLE: &'static str;
    /// Human name used in notifications ("Project", "User").
    const LABEL: &'static str;

    fn id(&self) -> &Self::Id;

    /// Apply an update body to the local copy.
    fn apply(&mut self, patch: &Self::Patch);

    /// Canonical sort key for the collection.
    fn ordering() -> Order;

    fn id_filter(id: &Self::Id) -> Filter {
        Filter::eq("id", id)
    }
}

/// Async row storage.
pub trait RemoteStore {
    /// Rows matching the query. With `single`, anything but exactly one row
    /// is an error.
    fn select(&self, query: &Query) -> impl Future<Output = Result<Vec<Value>, DataError>>;

    /// Insert a row and return it as stored, including generated columns.
    fn insert(&self, table: &str, row: Value) -> impl Future<Output = Result<Value, DataError>>;

    /// Merge `patch` into every row matching `filter`.
    fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> impl Future<Output = Result<(), DataError>>;

    /// Delete every row matching `filter`.
    fn delete(&self, table: &str, filter: &Filter) -> impl Future<Output = Result<(), DataError>>;
}

/// Fetch a whole collection in its canonical order.
pub async fn fetch_all<R: Resource>(store: &impl RemoteStore) -> Result<Vec<R>, DataError> {
    let query = Query::table(R::TABLE).order_by(R::ordering());
    store
        .select(&query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(DataError::from))
        .collect()
}

/// Fetch a single row by id.
pub async fn fetch_one<R: Resource>(store: &impl RemoteStore, id: &R::Id) -> Result<R, DataError> {
    let query = Query::table(R::TABLE).eq("id", id).single();
    let row = store
        .select(&query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DataError::NotFound(format!("{} {id}", R::LABEL)))?;
    Ok(serde_json::from_value(row)?)
}

/// Session change notifications pushed by the auth backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
}

impl AuthEvent {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }
}

/// Result of a sign-up; the backend decides whether the account is usable yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    ConfirmationRequired,
    SignedIn(AuthSession),
}

/// A live subscription to [`AuthEvent`]s.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    pub fn new(rx: broadcast::Receiver<AuthEvent>) -> Self {
        Self { rx }
    }

    /// Next event, or `None` once the backend has gone away.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Auth subscription lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Release the subscription.
    pub fn unsubscribe(self) {
        tracing::debug!("Auth subscription released");
    }
}

/// Async authentication backend.
pub trait AuthBackend {
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SignUpOutcome, AuthError>>;

    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthSession, AuthError>>;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>>;

    /// The session the backend currently holds, if any. No sign-in happens here.
    fn get_session(&self) -> impl Future<Output = Result<Option<AuthSession>, AuthError>>;

    fn subscribe(&self) -> AuthSubscription;
}
