use dioxus::prelude::*;
use store::{filter_profiles, Profile, Tier, TierPatch};
use ui::{use_toasts, use_watch, Access, ResourceController, SessionStore};

use crate::guard::Guarded;
use crate::Backend;

type UserController = ResourceController<Profile, Backend>;

#[component]
pub fn Users() -> Element {
    rsx! {
        Guarded { access: Access::Admin, UserTable {} }
    }
}

#[component]
fn UserTable() -> Element {
    let session = use_context::<SessionStore<Backend>>();
    let toasts = use_toasts();

    let users = use_hook(|| {
        UserController::new(session.backend().cloned(), session.subscribe(), toasts.clone())
    });
    use_drop({
        let users = users.clone();
        move || users.detach()
    });
    let state = use_watch({
        let users = users.clone();
        move || users.subscribe()
    });
    use_future({
        let users = users.clone();
        move || {
            let users = users.clone();
            async move {
                if users.load().await.is_err() {
                    tracing::debug!("User list unavailable");
                }
            }
        }
    });

    let mut search = use_signal(String::new);
    let current = state();
    let term = search();
    let visible = filter_profiles(&current.items, &term);

    rsx! {
        h2 { "User Management" }
        p { style: "color: #a1a1aa; font-size: 0.875rem;", "Manage user access and subscription tiers." }
        input {
            r#type: "search",
            placeholder: "Search users by email...",
            value: "{term}",
            oninput: move |evt| search.set(evt.value()),
        }

        if current.loading && current.items.is_empty() {
            div { class: "page-status", "Loading users..." }
        } else if let Some(e) = &current.error {
            div { class: "form-error", "Error loading users: {e}" }
        } else if visible.is_empty() {
            div { class: "page-status", "No users found." }
        } else {
            table {
                style: "margin-top: 1.5rem;",
                thead {
                    tr {
                        th { "User" }
                        th { "Joined" }
                        th { "Tier" }
                    }
                }
                tbody {
                    for profile in visible {
                        UserRow {
                            key: "{profile.id}",
                            busy: current.is_pending(&profile.id),
                            profile: profile.clone(),
                            users: users.clone(),
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn UserRow(profile: Profile, busy: bool, users: UserController) -> Element {
    let id = profile.id.clone();

    let onchange = move |evt: Event<FormData>| {
        let tier = match evt.value().parse::<Tier>() {
            Ok(tier) => tier,
            Err(e) => {
                tracing::warn!("{}", e);
                return;
            }
        };
        let users = users.clone();
        let id = id.clone();
        spawn(async move {
            if let Err(e) = users.update(&id, TierPatch { tier }).await {
                tracing::debug!("Tier change for {} failed: {}", id, e);
            }
        });
    };

    rsx! {
        tr {
            td { {profile.email.clone().unwrap_or_else(|| profile.id.clone())} }
            td { {profile.created_date().unwrap_or("-").to_string()} }
            td {
                select {
                    value: "{profile.tier.as_str()}",
                    disabled: busy,
                    onchange,
                    for tier in Tier::ALL {
                        option {
                            value: "{tier.as_str()}",
                            selected: tier == profile.tier,
                            "{tier.label()}"
                        }
                    }
                }
            }
        }
    }
}
