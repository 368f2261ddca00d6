use dioxus::prelude::*;

use crate::hooks::use_session_state;

/// Side navigation. `children` are the page links; the account area at the
/// bottom shows the signed-in identity and a sign-out button.
#[component]
pub fn Navbar(on_sign_out: EventHandler<()>, children: Element) -> Element {
    let session = use_session_state();
    let state = session();

    rsx! {
        nav {
            class: "navbar",
            div { class: "navbar-links", {children} }
            if let Some(identity) = state.identity() {
                div {
                    class: "navbar-account",
                    span { class: "navbar-avatar", title: "{identity.email}", "{identity.initial()}" }
                    span { class: "navbar-tier", "{state.effective_tier().label()}" }
                    button {
                        class: "navbar-sign-out",
                        onclick: move |_| on_sign_out.call(()),
                        "Sign Out"
                    }
                }
            }
        }
    }
}
