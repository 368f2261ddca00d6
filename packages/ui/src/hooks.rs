//! Hooks bridging the core's `watch` channels into Dioxus signals.

use dioxus::prelude::*;
use tokio::sync::watch;

use crate::session::SessionState;
use crate::toast::ToastQueue;

/// Mirror a `watch` channel into a signal that re-renders on every change.
pub fn use_watch<T: Clone + 'static>(subscribe: impl FnOnce() -> watch::Receiver<T>) -> Signal<T> {
    let rx = use_hook(subscribe);
    let mut value = use_signal(|| rx.borrow().clone());
    use_future(move || {
        let mut rx = rx.clone();
        async move {
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                value.set(next);
            }
        }
    });
    value
}

/// The process-wide toast queue.
pub fn use_toasts() -> ToastQueue {
    use_context::<ToastQueue>()
}

/// Current session, as provided by the application root.
pub fn use_session_state() -> Signal<SessionState> {
    use_context::<Signal<SessionState>>()
}
