//! This crate contains the client core and the shared UI for the workspace.
//!
//! The core (session, resource controller, toasts, confirmation, route gate)
//! is plain async Rust over `tokio::sync::watch` channels and can be tested
//! without a renderer. The components at the bottom consume it through the
//! hooks in [`hooks`].

mod timer;

pub mod toast;
pub use toast::{Severity, Toast, ToastId, ToastQueue, TOAST_TIMEOUT};

pub mod confirm;
pub use confirm::{ConfirmGate, ConfirmId, ConfirmPrompt, PendingConfirmation};

pub mod session;
pub use session::{Session, SessionState, SessionStore};

pub mod resource;
pub use resource::{ConflictPolicy, ResourceController, ResourceState};

pub mod guard;
pub use guard::{gate, Access, Gate};

pub mod hooks;
pub use hooks::{use_session_state, use_toasts, use_watch};

mod modal;
pub use modal::{ConfirmModal, ModalOverlay};

mod navbar;
pub use navbar::Navbar;

mod toast_stack;
pub use toast_stack::ToastStack;
