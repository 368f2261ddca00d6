//! Blocking yes/no gate in front of destructive actions.
//!
//! At most one confirmation is pending. A new request replaces the open one,
//! so the modal only ever shows the latest; answers addressed to a replaced
//! request are ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

pub type ConfirmId = u64;

/// What the modal shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
}

impl ConfirmPrompt {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Delete".to_string(),
        }
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }
}

/// An open request: the prompt and the action to run on confirm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConfirmation<A> {
    pub id: ConfirmId,
    pub prompt: ConfirmPrompt,
    pub action: A,
}

#[derive(Debug)]
struct ConfirmInner<A> {
    pending: watch::Sender<Option<PendingConfirmation<A>>>,
    next_id: AtomicU64,
}

/// Shared handle to the confirmation gate.
#[derive(Debug)]
pub struct ConfirmGate<A> {
    inner: Arc<ConfirmInner<A>>,
}

impl<A> Clone for ConfirmGate<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> Default for ConfirmGate<A> {
    fn default() -> Self {
        let (pending, _) = watch::channel(None);
        Self {
            inner: Arc::new(ConfirmInner {
                pending,
                next_id: AtomicU64::new(0),
            }),
        }
    }
}

impl<A: Clone> ConfirmGate<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a confirmation, replacing any that is still pending.
    pub fn request(&self, prompt: ConfirmPrompt, action: A) -> ConfirmId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let replaced = self.inner.pending.send_replace(Some(PendingConfirmation {
            id,
            prompt,
            action,
        }));
        if let Some(old) = replaced {
            tracing::debug!("Confirmation {} replaced by {}", old.id, id);
        }
        id
    }

    /// Resolve `id` positively. Returns the action to run, or `None` when
    /// `id` is not the pending request.
    pub fn confirm(&self, id: ConfirmId) -> Option<A> {
        self.take(id).map(|pending| pending.action)
    }

    /// Resolve `id` negatively. Returns whether `id` was pending.
    pub fn cancel(&self, id: ConfirmId) -> bool {
        self.take(id).is_some()
    }

    fn take(&self, id: ConfirmId) -> Option<PendingConfirmation<A>> {
        let mut taken = None;
        self.inner.pending.send_if_modified(|pending| {
            if pending.as_ref().is_some_and(|p| p.id == id) {
                taken = pending.take();
                true
            } else {
                false
            }
        });
        if taken.is_none() {
            tracing::debug!("Ignoring answer to stale confirmation {}", id);
        }
        taken
    }

    pub fn pending(&self) -> Option<PendingConfirmation<A>> {
        self.inner.pending.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PendingConfirmation<A>>> {
        self.inner.pending.subscribe()
    }
}
