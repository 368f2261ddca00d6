use dioxus::prelude::*;
use ui::{gate, use_session_state, Access, Gate};

use crate::Route;

fn route_for(path: &str) -> Route {
    match path {
        ui::guard::LOGIN_PATH => Route::Login {},
        _ => Route::Home {},
    }
}

/// Render `children` only when the session passes `access`; otherwise
/// redirect once the session has resolved.
#[component]
pub fn Guarded(access: Access, children: Element) -> Element {
    let session = use_session_state();
    let nav = use_navigator();

    use_effect(move || {
        if let Gate::Redirect(target) = gate(access, &session()) {
            tracing::debug!("Redirecting {:?} page to {}", access, target);
            nav.replace(route_for(target));
        }
    });

    match gate(access, &session()) {
        Gate::Allow => children,
        Gate::Wait => rsx! {
            div { class: "page-status", "Loading..." }
        },
        Gate::Redirect(_) => rsx! {},
    }
}
