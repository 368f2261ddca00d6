use dioxus::prelude::*;
use store::{placeholder_projects, PortfolioConfig, Project, ProjectForm, ProjectPatch};
use ui::{
    use_session_state, use_toasts, use_watch, ConfirmGate, ConfirmPrompt, ModalOverlay,
    ResourceController, SessionStore,
};

use crate::{Backend, ConfirmAction};

type ProjectController = ResourceController<Project, Backend>;

#[component]
pub fn Projects() -> Element {
    let session = use_context::<SessionStore<Backend>>();
    let config = use_context::<PortfolioConfig>();
    let gate = use_context::<ConfirmGate<ConfirmAction>>();
    let toasts = use_toasts();
    let session_state = use_session_state();

    let projects = use_hook(|| {
        ProjectController::new(session.backend().cloned(), session.subscribe(), toasts.clone())
    });
    use_drop({
        let projects = projects.clone();
        move || projects.detach()
    });
    let state = use_watch({
        let projects = projects.clone();
        move || projects.subscribe()
    });
    use_future({
        let projects = projects.clone();
        move || {
            let projects = projects.clone();
            async move {
                if projects.load().await.is_err() {
                    tracing::debug!("Project list unavailable");
                }
            }
        }
    });

    let mut form_open = use_signal(|| false);
    let mut editing = use_signal(|| Option::<i64>::None);
    let mut form = use_signal(ProjectForm::default);

    let current = state();
    let fallback = current.error.is_some() && current.items.is_empty() && config.ui.placeholder_projects;
    let items = if fallback {
        placeholder_projects()
    } else {
        current.items.clone()
    };
    let can_edit = session_state().is_admin() && !fallback;

    let on_edit = move |project: Project| {
        form.set(ProjectForm::from_project(&project));
        editing.set(Some(project.id));
        form_open.set(true);
    };
    let on_delete = {
        let projects = projects.clone();
        move |id: i64| {
            gate.request(
                ConfirmPrompt::new(
                    "Delete Project",
                    "Are you sure you want to delete this project? This action cannot be undone.",
                ),
                ConfirmAction::DeleteProject {
                    projects: projects.clone(),
                    id,
                },
            );
        }
    };

    rsx! {
        div {
            style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 2rem;",
            h2 { "Projects" }
            if can_edit {
                button {
                    class: "btn primary",
                    onclick: move |_| {
                        form.set(ProjectForm::default());
                        editing.set(None);
                        form_open.set(true);
                    },
                    "Add Project"
                }
            }
        }

        if current.loading && items.is_empty() {
            div { class: "page-status", "Loading projects..." }
        } else if items.is_empty() {
            div { class: "page-status", "No projects yet." }
        } else {
            div {
                class: "grid",
                for project in items {
                    ProjectCard {
                        key: "{project.id}",
                        project: project.clone(),
                        can_edit,
                        on_edit,
                        on_delete: on_delete.clone(),
                    }
                }
            }
        }

        if form_open() {
            ProjectFormModal {
                projects: projects.clone(),
                editing: editing(),
                form,
                on_close: move |_| form_open.set(false),
            }
        }
    }
}

#[component]
fn ProjectCard(
    project: Project,
    can_edit: bool,
    on_edit: EventHandler<Project>,
    on_delete: EventHandler<i64>,
) -> Element {
    let id = project.id;
    let edited = project.clone();

    rsx! {
        div {
            class: "card",
            div {
                style: "display: flex; justify-content: space-between; align-items: start;",
                h3 { style: "margin: 0 0 0.5rem;", "{project.title}" }
                if can_edit {
                    div {
                        style: "display: flex; gap: 0.25rem;",
                        button { class: "btn secondary", onclick: move |_| on_edit.call(edited.clone()), "Edit" }
                        button { class: "btn danger", onclick: move |_| on_delete.call(id), "Delete" }
                    }
                }
            }
            p { style: "color: #a1a1aa; font-size: 0.875rem;", "{project.description}" }
            div {
                class: "tags",
                for tech in project.tech_stack.iter() {
                    span { class: "tag", "{tech}" }
                }
            }
            div {
                style: "display: flex; gap: 1rem; margin-top: 1rem; font-size: 0.8125rem;",
                if let Some(link) = &project.link {
                    a { href: "{link}", target: "_blank", rel: "noopener noreferrer", "Download" }
                }
                if let Some(github) = &project.github {
                    a { href: "{github}", target: "_blank", rel: "noopener noreferrer", "GitHub" }
                }
            }
        }
    }
}

#[component]
fn ProjectFormModal(
    projects: ProjectController,
    editing: Option<i64>,
    form: Signal<ProjectForm>,
    on_close: EventHandler<()>,
) -> Element {
    let mut form = form;
    let mut error = use_signal(|| Option::<String>::None);
    let mut saving = use_signal(|| false);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        let draft = match form.read().to_draft() {
            Ok(draft) => draft,
            Err(message) => {
                error.set(Some(message));
                return;
            }
        };
        let projects = projects.clone();
        spawn(async move {
            error.set(None);
            saving.set(true);
            let result = match editing {
                Some(id) => projects.update(&id, ProjectPatch::from(draft)).await,
                None => projects.create(draft).await.map(|_| ()),
            };
            saving.set(false);
            if result.is_ok() {
                on_close.call(());
            }
        });
    };

    rsx! {
        ModalOverlay {
            on_close: move |_| on_close.call(()),
            h3 { style: "margin-top: 0;", if editing.is_some() { "Edit Project" } else { "New Project" } }
            form {
                onsubmit,
                label { "Project Title" }
                input {
                    placeholder: "e.g. Finance Dashboard",
                    value: "{form.read().title}",
                    oninput: move |evt| form.write().title = evt.value(),
                }
                label { "Description" }
                textarea {
                    rows: "3",
                    placeholder: "Brief description of the app...",
                    value: "{form.read().description}",
                    oninput: move |evt| form.write().description = evt.value(),
                }
                label { "Download URL" }
                input {
                    placeholder: "https://...",
                    value: "{form.read().link}",
                    oninput: move |evt| form.write().link = evt.value(),
                }
                label { "GitHub URL" }
                input {
                    placeholder: "https://...",
                    value: "{form.read().github}",
                    oninput: move |evt| form.write().github = evt.value(),
                }
                label { "Tech Stack (comma separated)" }
                input {
                    placeholder: "React, CSS, Node.js",
                    value: "{form.read().tech_stack}",
                    oninput: move |evt| form.write().tech_stack = evt.value(),
                }
                if let Some(message) = error() {
                    div { class: "form-error", "{message}" }
                }
                div {
                    style: "display: flex; gap: 0.75rem; margin-top: 1.5rem;",
                    button {
                        class: "btn secondary",
                        r#type: "button",
                        onclick: move |_| on_close.call(()),
                        "Cancel"
                    }
                    button {
                        class: "btn primary",
                        r#type: "submit",
                        disabled: saving(),
                        if saving() { "Saving..." } else if editing.is_some() { "Update Project" } else { "Create Project" }
                    }
                }
            }
        }
    }
}
