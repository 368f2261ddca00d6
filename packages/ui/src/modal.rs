use dioxus::prelude::*;

use crate::confirm::ConfirmPrompt;

/// A full-screen overlay that centers its children in a card.
/// Clicking outside the card triggers `on_close`.
#[component]
pub fn ModalOverlay(on_close: EventHandler<()>, children: Element) -> Element {
    rsx! {
        div {
            class: "modal-overlay",
            style: "position: fixed; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(0, 0, 0, 0.6); z-index: 2000;",
            onclick: move |_| on_close.call(()),
            div {
                class: "modal-card",
                style: "background: #1c1c1c; border: 1px solid rgba(255, 255, 255, 0.05); border-radius: 8px; max-width: 28rem; width: 100%; margin: 0 1rem; padding: 1.5rem;",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                {children}
            }
        }
    }
}

/// Yes/no dialog for the pending confirmation, if any.
#[component]
pub fn ConfirmModal(
    prompt: Option<ConfirmPrompt>,
    on_confirm: EventHandler<()>,
    on_cancel: EventHandler<()>,
) -> Element {
    let Some(prompt) = prompt else {
        return rsx! {};
    };

    rsx! {
        ModalOverlay {
            on_close: move |_| on_cancel.call(()),
            h3 { class: "modal-title", "{prompt.title}" }
            p { class: "modal-message", "{prompt.message}" }
            div {
                class: "modal-actions",
                style: "display: flex; gap: 0.75rem; margin-top: 1.5rem;",
                button {
                    class: "btn secondary",
                    onclick: move |_| on_cancel.call(()),
                    "Cancel"
                }
                button {
                    class: "btn danger",
                    onclick: move |_| on_confirm.call(()),
                    "{prompt.confirm_label}"
                }
            }
        }
    }
}
