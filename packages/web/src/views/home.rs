use dioxus::prelude::*;

use crate::Route;

#[component]
pub fn Home() -> Element {
    rsx! {
        section {
            class: "hero",
            style: "min-height: 80vh; display: flex; flex-direction: column; justify-content: center; align-items: center; text-align: center; gap: 2rem;",
            span { class: "tag", "Available for work" }
            h1 {
                style: "font-size: 3rem; letter-spacing: -0.05em; max-width: 48rem; margin: 0;",
                "Building applications for specific purposes."
            }
            p {
                style: "color: #a1a1aa; font-size: 1.125rem; max-width: 40rem;",
                "I build simple easy to use applications for many different games and purposes. All with a no subscription based plan."
            }
            Link { class: "btn primary", to: Route::Projects {}, "View Work" }
        }
        About {}
    }
}

#[component]
fn About() -> Element {
    rsx! {
        section {
            id: "about",
            style: "padding: 5rem 0;",
            h2 { style: "font-size: 2.25rem;", "I believe in a user-centered design approach." }
            p {
                style: "color: #a1a1aa; max-width: 40rem;",
                "Ensuring that every project I work on is tailored to meet the specific needs of its users."
            }
            div {
                class: "grid",
                AboutCard { heading: "Who I am", body: "Noah. 24 years old. Full Stack Developer." }
                AboutCard { heading: "Location", body: "United Kingdom" }
                AboutCard { heading: "Education", body: "BSc Computer Science, University of Technology, 2023" }
                AboutCard { heading: "Experience", body: "Senior Frontend Developer, Tech Solutions Inc. (2 years)" }
            }
        }
    }
}

#[component]
fn AboutCard(heading: &'static str, body: &'static str) -> Element {
    rsx! {
        div {
            class: "card",
            h3 { style: "color: #a1a1aa; font-size: 0.75rem; text-transform: uppercase; margin: 0 0 0.25rem;", "{heading}" }
            p { style: "font-size: 1.125rem; margin: 0;", "{body}" }
        }
    }
}
