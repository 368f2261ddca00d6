//! Email and password sign-in, with a toggle for creating an account.

use dioxus::prelude::*;
use ui::{use_toasts, SessionStore};

use crate::{Backend, Route};

#[component]
pub fn Login() -> Element {
    let session = use_context::<SessionStore<Backend>>();
    let toasts = use_toasts();
    let nav = use_navigator();

    let mut is_login = use_signal(|| true);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        let session = session.clone();
        let toasts = toasts.clone();
        spawn(async move {
            error.set(None);
            loading.set(true);
            if is_login() {
                match session.sign_in(&email(), &password()).await {
                    Ok(_) => {
                        nav.push(Route::Projects {});
                    }
                    Err(e) => error.set(Some(e.to_string())),
                }
            } else {
                match session.sign_up(&email(), &password()).await {
                    Ok(()) => {
                        toasts.success("Account created! You can now log in.");
                        is_login.set(true);
                    }
                    Err(e) => error.set(Some(e.to_string())),
                }
            }
            loading.set(false);
        });
    };

    rsx! {
        div {
            class: "card",
            style: "max-width: 28rem; margin: 6rem auto 0;",

            div {
                style: "display: flex; gap: 0.25rem; margin-bottom: 1.5rem;",
                button {
                    class: if is_login() { "btn primary" } else { "btn secondary" },
                    style: "flex: 1;",
                    onclick: move |_| is_login.set(true),
                    "Sign In"
                }
                button {
                    class: if is_login() { "btn secondary" } else { "btn primary" },
                    style: "flex: 1;",
                    onclick: move |_| is_login.set(false),
                    "Sign Up"
                }
            }

            form {
                onsubmit,
                label { "Email Address" }
                input {
                    r#type: "email",
                    required: true,
                    placeholder: "name@example.com",
                    value: "{email}",
                    oninput: move |evt| email.set(evt.value()),
                }
                label { "Password" }
                input {
                    r#type: "password",
                    required: true,
                    placeholder: "••••••••",
                    value: "{password}",
                    oninput: move |evt| password.set(evt.value()),
                }
                if let Some(message) = error() {
                    div { class: "form-error", "{message}" }
                }
                button {
                    class: "btn primary",
                    style: "width: 100%; margin-top: 1.5rem;",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() {
                        "Processing..."
                    } else if is_login() {
                        "Sign In"
                    } else {
                        "Create Account"
                    }
                }
            }
        }
    }
}
