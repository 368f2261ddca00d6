//! Transient notifications.
//!
//! A process-wide queue of toasts in arrival order. Each toast removes itself
//! after [`TOAST_TIMEOUT`] through a cancellable timer task keyed by its id;
//! [`ToastQueue::dismiss`] aborts that task and removes the toast at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{abortable, AbortHandle};
use tokio::sync::watch;

use crate::timer;

/// How long a toast stays up unless dismissed.
pub const TOAST_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

pub type ToastId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug)]
struct ToastInner {
    toasts: watch::Sender<Vec<Toast>>,
    timers: Mutex<HashMap<ToastId, AbortHandle>>,
    next_id: AtomicU64,
}

impl ToastInner {
    fn timers(&self) -> MutexGuard<'_, HashMap<ToastId, AbortHandle>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: ToastId) -> bool {
        self.timers().remove(&id);
        self.toasts.send_if_modified(|toasts| {
            let before = toasts.len();
            toasts.retain(|t| t.id != id);
            toasts.len() != before
        })
    }
}

/// Shared handle to the toast queue.
#[derive(Clone, Debug)]
pub struct ToastQueue {
    inner: Arc<ToastInner>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        let (toasts, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(ToastInner {
                toasts,
                timers: Mutex::default(),
                next_id: AtomicU64::new(0),
            }),
        }
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast and schedule its removal.
    pub fn push(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let message = message.into();
        match severity {
            Severity::Error => tracing::warn!("toast {}: {}", id, message),
            _ => tracing::debug!("toast {}: {}", id, message),
        }
        self.inner.toasts.send_modify(|toasts| {
            toasts.push(Toast {
                id,
                message,
                severity,
            })
        });

        let (expiry, handle) = abortable(timer::sleep(TOAST_TIMEOUT));
        self.inner.timers().insert(id, handle);
        let inner = Arc::downgrade(&self.inner);
        timer::spawn_detached(async move {
            if expiry.await.is_ok() {
                if let Some(inner) = inner.upgrade() {
                    inner.remove(id);
                }
            }
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.push(message, Severity::Success)
    }

    /// Remove a toast now and cancel its timer. Returns whether it was showing.
    pub fn dismiss(&self, id: ToastId) -> bool {
        if let Some(handle) = self.inner.timers().remove(&id) {
            handle.abort();
        }
        self.inner.remove(id)
    }

    /// Toasts currently showing, oldest first.
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.toasts.subscribe()
    }

    /// Number of auto-dismiss timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn messages(queue: &ToastQueue) -> Vec<String> {
        queue.toasts().into_iter().map(|t| t.message).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_stack_in_arrival_order() {
        let queue = ToastQueue::new();
        queue.push("one", Severity::Info);
        queue.success("two");
        queue.push("two", Severity::Error);

        assert_eq!(messages(&queue), vec!["one", "two", "two"]);
        let severities: Vec<Severity> = queue.toasts().iter().map(|t| t.severity).collect();
        assert_eq!(severities, vec![Severity::Info, Severity::Success, Severity::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_toast_expires_after_timeout() {
        let queue = ToastQueue::new();
        queue.push("first", Severity::Info);
        sleep(Duration::from_millis(2000)).await;
        queue.push("second", Severity::Info);

        sleep(Duration::from_millis(3001)).await;
        assert_eq!(messages(&queue), vec!["second"]);

        sleep(Duration::from_millis(2000)).await;
        assert!(queue.toasts().is_empty());
        assert_eq!(queue.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_still_visible_before_timeout() {
        let queue = ToastQueue::new();
        queue.push("hello", Severity::Info);
        sleep(Duration::from_millis(4999)).await;
        assert_eq!(messages(&queue), vec!["hello"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer() {
        let queue = ToastQueue::new();
        let first = queue.push("first", Severity::Info);
        sleep(Duration::from_millis(1000)).await;

        assert!(queue.dismiss(first));
        assert!(queue.toasts().is_empty());
        assert_eq!(queue.pending_timers(), 0);

        queue.push("second", Severity::Info);
        // Past the first toast's original deadline.
        sleep(Duration::from_millis(4500)).await;
        assert_eq!(messages(&queue), vec!["second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_unknown_id_is_noop() {
        let queue = ToastQueue::new();
        queue.push("keep", Severity::Info);
        assert!(!queue.dismiss(42));
        assert_eq!(messages(&queue), vec!["keep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_changes() {
        let queue = ToastQueue::new();
        let mut rx = queue.subscribe();
        let id = queue.push("ping", Severity::Info);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        queue.dismiss(id);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }
}
