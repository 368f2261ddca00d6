use dioxus::prelude::*;

use crate::hooks::{use_toasts, use_watch};
use crate::toast::Severity;

/// Renders the toast queue, oldest at the top.
#[component]
pub fn ToastStack() -> Element {
    let queue = use_toasts();
    let toasts = use_watch({
        let queue = queue.clone();
        move || queue.subscribe()
    });

    rsx! {
        div {
            class: "toast-stack",
            style: "position: fixed; bottom: 1.5rem; right: 1.5rem; display: flex; flex-direction: column; gap: 0.5rem; z-index: 3000;",
            for toast in toasts() {
                div {
                    key: "{toast.id}",
                    class: match toast.severity {
                        Severity::Error => "toast error",
                        Severity::Success => "toast success",
                        Severity::Info => "toast info",
                    },
                    role: "status",
                    span { "{toast.message}" }
                    button {
                        class: "toast-dismiss",
                        onclick: {
                            let queue = queue.clone();
                            move |_| {
                                queue.dismiss(toast.id);
                            }
                        },
                        "×"
                    }
                }
            }
        }
    }
}
