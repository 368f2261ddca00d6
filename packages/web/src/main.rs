use dioxus::prelude::*;

use api::SupabaseClient;
use store::{PortfolioConfig, Project};
use ui::{ConfirmGate, ResourceController, SessionStore, ToastQueue};
use views::{Home, Login, Projects, Shell, Users};

mod guard;
mod views;

/// The backend the browser build talks to.
pub(crate) type Backend = SupabaseClient;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Shell)]
        #[route("/")]
        Home {},
        #[route("/projects")]
        Projects {},
        #[route("/users")]
        Users {},
        #[route("/login")]
        Login {},
    #[end_layout]
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

/// Actions that wait behind the confirmation modal.
#[derive(Clone, PartialEq)]
pub(crate) enum ConfirmAction {
    SignOut,
    DeleteProject {
        projects: ResourceController<Project, Backend>,
        id: i64,
    },
}

/// Long-lived state created once at startup.
#[derive(Clone)]
struct AppCore {
    config: PortfolioConfig,
    session: SessionStore<Backend>,
    toasts: ToastQueue,
    confirm: ConfirmGate<ConfirmAction>,
}

impl AppCore {
    fn new() -> Self {
        let config = PortfolioConfig::from_build_env();
        let backend = SupabaseClient::connect(&config.backend);
        Self {
            session: SessionStore::new(backend),
            toasts: ToastQueue::new(),
            confirm: ConfirmGate::new(),
            config,
        }
    }
}

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let core = use_hook(AppCore::new);

    use_context_provider(|| core.config.clone());
    use_context_provider(|| core.session.clone());
    use_context_provider(|| core.toasts.clone());
    use_context_provider(|| core.confirm.clone());
    let session_state = ui::use_watch({
        let session = core.session.clone();
        move || session.subscribe()
    });
    use_context_provider(|| session_state);

    use_hook({
        let session = core.session.clone();
        move || {
            if let Some(listener) = session.start() {
                spawn(listener);
            }
        }
    });
    use_drop({
        let session = core.session.clone();
        move || {
            session.stop();
        }
    });

    rsx! {
        style { {views::APP_CSS} }
        Router::<Route> {}
    }
}

/// Unknown paths go home.
#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let nav = use_navigator();
    tracing::debug!("No route for /{}", segments.join("/"));
    nav.replace(Route::Home {});
    rsx! {}
}
