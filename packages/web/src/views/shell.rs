//! Page chrome shared by every route: navigation, toasts, and the
//! confirmation modal.

use dioxus::prelude::*;
use ui::{
    use_session_state, use_toasts, use_watch, ConfirmGate, ConfirmModal, ConfirmPrompt, Navbar,
    SessionStore, ToastStack,
};

use crate::{Backend, ConfirmAction, Route};

#[component]
pub fn Shell() -> Element {
    let session = use_session_state();
    let gate = use_context::<ConfirmGate<ConfirmAction>>();
    let state = session();

    let request_sign_out = move |_| {
        gate.request(
            ConfirmPrompt::new("Sign Out", "Are you sure you want to sign out of your account?")
                .with_confirm_label("Sign Out"),
            ConfirmAction::SignOut,
        );
    };

    rsx! {
        Navbar {
            on_sign_out: request_sign_out,
            Link { to: Route::Home {}, "Home" }
            a { href: "/#about", "About" }
            Link { to: Route::Projects {}, "Projects" }
            if state.is_admin() {
                Link { to: Route::Users {}, "Users" }
            }
            if state.session().is_none() {
                Link { to: Route::Login {}, "Login" }
            }
        }
        main { class: "content", Outlet::<Route> {} }
        ToastStack {}
        ConfirmDialog {}
    }
}

/// Shows the pending confirmation and runs its action once confirmed.
#[component]
fn ConfirmDialog() -> Element {
    let gate = use_context::<ConfirmGate<ConfirmAction>>();
    let session = use_context::<SessionStore<Backend>>();
    let toasts = use_toasts();
    let nav = use_navigator();
    let pending = use_watch({
        let gate = gate.clone();
        move || gate.subscribe()
    });

    let current = pending();
    let id = current.as_ref().map(|p| p.id);

    let on_cancel = {
        let gate = gate.clone();
        move |_| {
            if let Some(id) = id {
                gate.cancel(id);
            }
        }
    };

    let on_confirm = move |_| {
        let Some(action) = id.and_then(|id| gate.confirm(id)) else {
            return;
        };
        let session = session.clone();
        let toasts = toasts.clone();
        spawn(async move {
            match action {
                ConfirmAction::SignOut => {
                    session.sign_out().await;
                    toasts.success("Logged out successfully");
                    nav.push(Route::Home {});
                }
                ConfirmAction::DeleteProject { projects, id } => {
                    if let Err(e) = projects.remove(&id).await {
                        tracing::debug!("Delete of project {} failed: {}", id, e);
                    }
                }
            }
        });
    };

    rsx! {
        ConfirmModal {
            prompt: current.map(|p| p.prompt),
            on_confirm,
            on_cancel,
        }
    }
}
