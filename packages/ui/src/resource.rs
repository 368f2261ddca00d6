//! # Resource controller — optimistic CRUD over a server-owned collection
//!
//! One [`ResourceController`] mirrors one collection (`projects`, `profiles`)
//! and is the only writer of that mirror. The mirror is published as a
//! [`ResourceState`] through a `watch` channel for the views to render.
//!
//! | Operation | Local effect | On remote failure |
//! |-----------|--------------|-------------------|
//! | `load`   | replace items, clear error | keep items, record error |
//! | `create` | append the stored row once the server returns it | nothing to undo |
//! | `update` | apply the patch **before** the write is sent | reload; restore the snapshot if the reload fails too |
//! | `remove` | drop the row **after** the server confirmed | row stays |
//!
//! `create`, `update` and `remove` are refused with [`DataError::Forbidden`]
//! and no remote call unless the session's effective tier is admin. This is
//! a fast path for the interface; the backend enforces its own policy and its
//! refusals come back as ordinary write failures.
//!
//! Every terminal outcome of a mutation raises exactly one toast.
//!
//! ## Concurrency
//!
//! Under [`ConflictPolicy::LastWriteWins`] two updates to the same id both
//! apply locally and both go out. While any mutation on an id is pending the
//! mirror shows the patches in the order they were made. Once the last one
//! settles the row is reconciled with the server: reloaded if any update in
//! that batch failed, otherwise set to the pre-batch value with the
//! successful patches applied in the order the server acknowledged them.
//! [`ConflictPolicy::RejectInFlight`] refuses a second mutation on an id
//! while one is still pending.
//!
//! Ids with a pending mutation are published in [`ResourceState::pending`].
//!
//! A view that goes away calls [`ResourceController::detach`]. Results that
//! arrive afterwards are still returned to the caller but no longer touch the
//! mirror or the toast queue. Loads are numbered so an older load finishing
//! after a newer one is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::{fetch_all, DataError, RemoteStore, Resource};
use tokio::sync::watch;

use crate::session::SessionState;
use crate::toast::{Severity, ToastQueue};

/// What to do with a mutation on an id that already has one in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    LastWriteWins,
    RejectInFlight,
}

/// Observable state of a mirrored collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceState<R: Resource> {
    pub items: Vec<R>,
    pub loading: bool,
    pub error: Option<DataError>,
    /// Ids with an update or delete still waiting on the server.
    pub pending: HashSet<R::Id>,
}

impl<R: Resource> Default for ResourceState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            pending: HashSet::new(),
        }
    }
}

impl<R: Resource> ResourceState<R> {
    pub fn is_pending(&self, id: &R::Id) -> bool {
        self.pending.contains(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Mutation::Create => "created",
            Mutation::Update => "updated",
            Mutation::Delete => "deleted",
        }
    }

    fn progressive(self) -> &'static str {
        match self {
            Mutation::Create => "creating",
            Mutation::Update => "updating",
            Mutation::Delete => "deleting",
        }
    }
}

struct ControllerInner<R: Resource, S> {
    store: Option<S>,
    session: watch::Receiver<SessionState>,
    toasts: ToastQueue,
    state: watch::Sender<ResourceState<R>>,
    policy: ConflictPolicy,
    in_flight: Mutex<HashMap<R::Id, Batch<R>>>,
    detached: AtomicBool,
    load_epoch: AtomicU64,
}

/// Mutations on one id that overlap in time.
struct Batch<R> {
    count: usize,
    /// Row as the server should hold it: the value before the batch plus
    /// every acknowledged patch, in acknowledgement order.
    confirmed: Option<R>,
    /// An update in the batch failed, so the mirror can only be trusted
    /// after a reload.
    diverged: bool,
}

/// What the last mutation of a batch leaves behind.
struct Settled<R> {
    confirmed: Option<R>,
    diverged: bool,
}

impl<R: Resource, S> ControllerInner<R, S> {
    fn in_flight(&self) -> MutexGuard<'_, HashMap<R::Id, Batch<R>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_pending(&self, id: &R::Id, pending: bool) {
        if self.detached.load(Ordering::SeqCst) {
            return;
        }
        self.state.send_modify(|state| {
            if pending {
                state.pending.insert(id.clone());
            } else {
                state.pending.remove(id);
            }
        });
    }
}

/// Marks an id as having a mutation in flight until finished or dropped.
struct InFlight<'a, R: Resource, S> {
    inner: &'a ControllerInner<R, S>,
    id: R::Id,
    done: bool,
}

impl<R: Resource, S> InFlight<'_, R, S> {
    /// Record the outcome. Returns the batch once no other mutation on the
    /// id is pending.
    fn finish(mut self, acknowledged: Option<&R::Patch>, diverged: bool) -> Option<Settled<R>> {
        self.done = true;
        self.release(acknowledged, diverged)
    }

    fn release(&self, acknowledged: Option<&R::Patch>, diverged: bool) -> Option<Settled<R>> {
        let settled = {
            let mut in_flight = self.inner.in_flight();
            let batch = in_flight.get_mut(&self.id)?;
            if let (Some(patch), Some(row)) = (acknowledged, batch.confirmed.as_mut()) {
                row.apply(patch);
            }
            batch.diverged |= diverged;
            batch.count -= 1;
            if batch.count > 0 {
                return None;
            }
            in_flight.remove(&self.id).map(|batch| Settled {
                confirmed: batch.confirmed,
                diverged: batch.diverged,
            })
        };
        self.inner.publish_pending(&self.id, false);
        settled
    }
}

impl<R: Resource, S> Drop for InFlight<'_, R, S> {
    fn drop(&mut self) {
        if !self.done {
            // Cancelled mid-write: the outcome is unknown.
            self.release(None, true);
        }
    }
}

/// Shared handle to a collection mirror.
pub struct ResourceController<R: Resource, S> {
    inner: Arc<ControllerInner<R, S>>,
}

impl<R: Resource, S> Clone for ResourceController<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource, S> PartialEq for ResourceController<R, S> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<R: Resource, S: RemoteStore> ResourceController<R, S> {
    /// A controller with the default [`ConflictPolicy`]. `session` supplies
    /// the tier checked before every mutation.
    pub fn new(
        store: Option<S>,
        session: watch::Receiver<SessionState>,
        toasts: ToastQueue,
    ) -> Self {
        Self::with_policy(store, session, toasts, ConflictPolicy::default())
    }

    pub fn with_policy(
        store: Option<S>,
        session: watch::Receiver<SessionState>,
        toasts: ToastQueue,
        policy: ConflictPolicy,
    ) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            inner: Arc::new(ControllerInner {
                store,
                session,
                toasts,
                state,
                policy,
                in_flight: Mutex::default(),
                detached: AtomicBool::new(false),
                load_epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> ResourceState<R> {
        self.inner.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<R> {
        self.inner.state.borrow().items.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<R>> {
        self.inner.state.subscribe()
    }

    /// Stop applying results to the mirror. Pending operations still finish.
    pub fn detach(&self) {
        if !self.inner.detached.swap(true, Ordering::SeqCst) {
            tracing::debug!("{} controller detached", R::LABEL);
        }
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::SeqCst)
    }

    fn store(&self) -> Result<&S, DataError> {
        self.inner.store.as_ref().ok_or(DataError::Unavailable)
    }

    fn label(&self) -> String {
        R::LABEL.to_lowercase()
    }

    fn notify(&self, message: String, severity: Severity) {
        if self.is_detached() {
            tracing::debug!("Dropping notification for detached controller: {}", message);
            return;
        }
        self.inner.toasts.push(message, severity);
    }

    fn notify_success(&self, mutation: Mutation) {
        self.notify(
            format!("{} {} successfully", R::LABEL, mutation.past()),
            Severity::Success,
        );
    }

    fn notify_failure(&self, mutation: Mutation, err: &DataError) {
        self.notify(
            format!("Error {} {}: {}", mutation.progressive(), self.label(), err),
            Severity::Error,
        );
    }

    /// Apply `f` to the mirror unless the controller was detached.
    fn modify(&self, f: impl FnOnce(&mut ResourceState<R>)) {
        if self.is_detached() {
            tracing::debug!("Ignoring late {} result", R::LABEL);
            return;
        }
        self.inner.state.send_modify(f);
    }

    fn authorize(&self, mutation: Mutation) -> Result<(), DataError> {
        if self.inner.session.borrow().is_admin() {
            return Ok(());
        }
        tracing::warn!("Refusing to {} {} without admin tier", mutation.verb(), R::LABEL);
        self.notify(
            format!("Not authorized to {} {}s", mutation.verb(), self.label()),
            Severity::Error,
        );
        Err(DataError::Forbidden)
    }

    fn begin(&self, mutation: Mutation, id: &R::Id) -> Result<InFlight<'_, R, S>, DataError> {
        {
            let mut in_flight = self.inner.in_flight();
            if let Some(batch) = in_flight.get_mut(id) {
                if self.inner.policy == ConflictPolicy::RejectInFlight {
                    drop(in_flight);
                    let err = DataError::Conflict(format!(
                        "{} {} has a change in flight",
                        R::LABEL,
                        id
                    ));
                    self.notify_failure(mutation, &err);
                    return Err(err);
                }
                batch.count += 1;
            } else {
                let confirmed = self
                    .inner
                    .state
                    .borrow()
                    .items
                    .iter()
                    .find(|item| item.id() == id)
                    .cloned();
                in_flight.insert(
                    id.clone(),
                    Batch {
                        count: 1,
                        confirmed,
                        diverged: false,
                    },
                );
            }
        }
        self.inner.publish_pending(id, true);
        Ok(InFlight {
            inner: &self.inner,
            id: id.clone(),
            done: false,
        })
    }

    /// Bring a row back in line with the server once its batch has settled.
    async fn reconcile(&self, id: &R::Id, settled: Option<Settled<R>>) {
        let Some(settled) = settled else {
            return;
        };
        if self.is_detached() {
            return;
        }
        if !settled.diverged {
            if let Some(row) = settled.confirmed {
                self.restore(row);
            }
            return;
        }
        if self.load().await.is_err() {
            if let Some(row) = settled.confirmed {
                tracing::warn!("Reload failed, restoring {} {}", R::LABEL, id);
                self.restore(row);
            }
        }
    }

    /// Fetch the whole collection in its canonical order.
    pub async fn load(&self) -> Result<Vec<R>, DataError> {
        let epoch = self.inner.load_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.modify(|state| state.loading = true);

        let result = match self.store() {
            Ok(store) => fetch_all::<R>(store).await,
            Err(e) => Err(e),
        };

        if self.inner.load_epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("Dropping stale {} load {}", R::LABEL, epoch);
            return result;
        }
        match &result {
            Ok(items) => {
                tracing::debug!("Loaded {} {} rows", items.len(), R::TABLE);
                self.modify(|state| {
                    state.items = items.clone();
                    state.error = None;
                    state.loading = false;
                });
            }
            Err(e) => {
                tracing::error!("Error fetching {}: {}", R::TABLE, e);
                self.modify(|state| {
                    state.error = Some(e.clone());
                    state.loading = false;
                });
            }
        }
        result
    }

    async fn insert(&self, draft: &R::Draft) -> Result<R, DataError> {
        let store = self.store()?;
        let stored = store.insert(R::TABLE, serde_json::to_value(draft)?).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Insert a new row and append what the server stored.
    pub async fn create(&self, draft: R::Draft) -> Result<R, DataError> {
        self.authorize(Mutation::Create)?;
        match self.insert(&draft).await {
            Ok(item) => {
                self.modify(|state| state.items.push(item.clone()));
                self.notify_success(Mutation::Create);
                Ok(item)
            }
            Err(e) => {
                self.notify_failure(Mutation::Create, &e);
                Err(e)
            }
        }
    }

    fn apply_local(&self, id: &R::Id, patch: &R::Patch) {
        self.modify(|state| {
            if let Some(item) = state.items.iter_mut().find(|item| item.id() == id) {
                item.apply(patch);
            }
        });
    }

    fn restore(&self, snapshot: R) {
        self.modify(|state| {
            if let Some(item) = state
                .items
                .iter_mut()
                .find(|item| item.id() == snapshot.id())
            {
                *item = snapshot;
            }
        });
    }

    async fn write_update(&self, id: &R::Id, patch: &R::Patch) -> Result<(), DataError> {
        let store = self.store()?;
        store
            .update(R::TABLE, &R::id_filter(id), serde_json::to_value(patch)?)
            .await
    }

    /// Optimistic update. The patch is visible in the mirror as soon as this
    /// future is first polled; the remote write follows.
    pub async fn update(&self, id: &R::Id, patch: R::Patch) -> Result<(), DataError> {
        self.authorize(Mutation::Update)?;
        let in_flight = self.begin(Mutation::Update, id)?;
        self.apply_local(id, &patch);

        let result = self.write_update(id, &patch).await;
        let settled = match &result {
            Ok(()) => {
                self.notify_success(Mutation::Update);
                in_flight.finish(Some(&patch), false)
            }
            Err(e) => {
                self.notify_failure(Mutation::Update, e);
                in_flight.finish(None, true)
            }
        };
        self.reconcile(id, settled).await;
        result
    }

    /// Delete a row. The mirror only changes once the server confirmed.
    pub async fn remove(&self, id: &R::Id) -> Result<(), DataError> {
        self.authorize(Mutation::Delete)?;
        let in_flight = self.begin(Mutation::Delete, id)?;

        let result = match self.store() {
            Ok(store) => store.delete(R::TABLE, &R::id_filter(id)).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(()) => {
                self.modify(|state| state.items.retain(|item| item.id() != id));
                self.notify_success(Mutation::Delete);
            }
            Err(e) => self.notify_failure(Mutation::Delete, e),
        }
        // A failed delete changed nothing locally.
        let settled = in_flight.finish(None, false);
        self.reconcile(id, settled).await;
        result
    }
}
