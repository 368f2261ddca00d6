//! # Domain models for profiles and projects
//!
//! Defines the rows stored by the backend (`profiles`, `projects`) together with
//! the values the client sends back when creating or editing them. Every type is
//! `Serialize + Deserialize` because rows travel as JSON objects through
//! [`crate::RemoteStore`].
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Identity`] | The authenticated account: opaque id and email. |
//! | [`AuthSession`] | An identity plus the access token the backend issued for it. |
//! | [`Profile`] | One row of `profiles`, one-to-one with an identity; carries the [`Tier`]. |
//! | [`Project`] | One row of `projects`, ordered by its server-assigned `id`. |
//! | [`ProjectDraft`] / [`ProjectPatch`] | Insert body and partial update body for projects. |
//! | [`TierPatch`] | Update body for a profile's tier. |
//! | [`ProjectForm`] | Raw text of the add/edit form, converted with [`ProjectForm::to_draft`]. |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::query::{Direction, Order};
use crate::remote::Resource;

/// Authorization level of a profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Paid,
    Admin,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Paid, Tier::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Paid => "paid",
            Tier::Admin => "admin",
        }
    }

    /// Capitalised name for display.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Paid => "Paid",
            Tier::Admin => "Admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Tier::Admin)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "paid" => Ok(Tier::Paid),
            "admin" => Ok(Tier::Admin),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// The authenticated account as reported by the auth backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

impl Identity {
    /// First letter of the email, uppercased, for avatar badges.
    pub fn initial(&self) -> String {
        self.email
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// A signed-in identity together with its bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    pub access_token: String,
}

/// Email/password pair submitted by the login form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A row of the `profiles` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as [`Identity::id`].
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tier: Tier,
    /// RFC 3339 timestamp set by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Profile {
    /// Date part of `created_at` ("2024-03-01"), if present.
    pub fn created_date(&self) -> Option<&str> {
        self.created_at.as_deref().map(|ts| ts.split('T').next().unwrap_or(ts))
    }
}

/// Update body for a profile's tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPatch {
    pub tier: Tier,
}

/// Insert body for profiles. Profiles are created by the backend on sign-up,
/// so the client never sends one; the type exists to satisfy [`Resource`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub id: String,
    pub email: Option<String>,
}

impl Resource for Profile {
    type Id = String;
    type Draft = ProfileDraft;
    type Patch = TierPatch;

    const TABLE: &'static str = "profiles";
    const LABEL: &'static str = "User";

    fn id(&self) -> &String {
        &self.id
    }

    fn apply(&mut self, patch: &TierPatch) {
        self.tier = patch.tier;
    }

    fn ordering() -> Order {
        Order::new("created_at", Direction::Descending)
    }
}

/// Case-insensitive substring search over profile emails.
pub fn filter_profiles<'a>(profiles: &'a [Profile], term: &str) -> Vec<&'a Profile> {
    let needle = term.trim().to_lowercase();
    profiles
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.email
                    .as_deref()
                    .is_some_and(|email| email.to_lowercase().contains(&needle))
        })
        .collect()
}

/// A row of the `projects` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Download or live link.
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

/// Insert body for a new project; the id is assigned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub link: Option<String>,
    pub github: Option<String>,
}

/// Partial update for a project. `None` leaves a field untouched; for the
/// optional URLs, `Some(None)` clears the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<Option<String>>,
}

impl From<ProjectDraft> for ProjectPatch {
    fn from(draft: ProjectDraft) -> Self {
        Self {
            title: Some(draft.title),
            description: Some(draft.description),
            tech_stack: Some(draft.tech_stack),
            link: Some(draft.link),
            github: Some(draft.github),
        }
    }
}

impl Resource for Project {
    type Id = i64;
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    const TABLE: &'static str = "projects";
    const LABEL: &'static str = "Project";

    fn id(&self) -> &i64 {
        &self.id
    }

    fn apply(&mut self, patch: &ProjectPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(tech_stack) = &patch.tech_stack {
            self.tech_stack = tech_stack.clone();
        }
        if let Some(link) = &patch.link {
            self.link = link.clone();
        }
        if let Some(github) = &patch.github {
            self.github = github.clone();
        }
    }

    fn ordering() -> Order {
        Order::new("id", Direction::Ascending)
    }
}

/// Built-in showcase entries rendered when the backend cannot be reached.
pub fn placeholder_projects() -> Vec<Project> {
    vec![
        Project {
            id: 1,
            title: "Finance Dashboard".to_string(),
            description: "A comprehensive dashboard for tracking personal expenses and investments with real-time data visualization.".to_string(),
            tech_stack: vec!["React".to_string(), "D3.js".to_string(), "Supabase".to_string()],
            link: None,
            github: None,
        },
        Project {
            id: 2,
            title: "E-commerce Platform".to_string(),
            description: "Minimalist online store with seamless checkout experience and administrative control panel.".to_string(),
            tech_stack: vec!["Next.js".to_string(), "Stripe".to_string(), "Tailwind".to_string()],
            link: None,
            github: None,
        },
    ]
}

/// Raw text of the project add/edit form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    /// Comma separated: "React, CSS, Node.js"
    pub tech_stack: String,
    pub link: String,
    pub github: String,
}

impl ProjectForm {
    /// Prefill the form for editing an existing project.
    pub fn from_project(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            tech_stack: project.tech_stack.join(", "),
            link: project.link.clone().unwrap_or_default(),
            github: project.github.clone().unwrap_or_default(),
        }
    }

    /// Validate and convert into an insert body.
    pub fn to_draft(&self) -> Result<ProjectDraft, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err("Description is required".to_string());
        }

        Ok(ProjectDraft {
            title: title.to_string(),
            description: description.to_string(),
            tech_stack: self
                .tech_stack
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            link: non_empty(&self.link),
            github: non_empty(&self.github),
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parses_and_serializes_lowercase() {
        assert_eq!("paid".parse::<Tier>(), Ok(Tier::Paid));
        assert!("owner".parse::<Tier>().is_err());
        let json = serde_json::to_value(TierPatch { tier: Tier::Admin }).unwrap();
        assert_eq!(json, serde_json::json!({ "tier": "admin" }));
    }

    #[test]
    fn test_profile_defaults_to_free_tier() {
        let profile: Profile = serde_json::from_value(serde_json::json!({ "id": "u1" })).unwrap();
        assert_eq!(profile.tier, Tier::Free);
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_form_to_draft_splits_tech_stack() {
        let form = ProjectForm {
            title: " Globe ".to_string(),
            description: "Spinning".to_string(),
            tech_stack: "React, , three.js ,CSS".to_string(),
            link: "".to_string(),
            github: "https://github.com/x/globe".to_string(),
        };
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.title, "Globe");
        assert_eq!(draft.tech_stack, vec!["React", "three.js", "CSS"]);
        assert_eq!(draft.link, None);
        assert_eq!(draft.github.as_deref(), Some("https://github.com/x/globe"));
    }

    #[test]
    fn test_form_requires_title_and_description() {
        let mut form = ProjectForm::default();
        assert_eq!(form.to_draft().unwrap_err(), "Title is required");
        form.title = "X".to_string();
        assert_eq!(form.to_draft().unwrap_err(), "Description is required");
    }

    #[test]
    fn test_form_prefill_joins_tech_stack() {
        let project = &placeholder_projects()[0];
        let form = ProjectForm::from_project(project);
        assert_eq!(form.tech_stack, "React, D3.js, Supabase");
        assert_eq!(form.link, "");
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ProjectPatch {
            title: Some("New".to_string()),
            link: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "New", "link": null }));

        let mut project = placeholder_projects().remove(0);
        project.link = Some("https://example.com".to_string());
        project.apply(&patch);
        assert_eq!(project.title, "New");
        assert_eq!(project.link, None);
        assert_eq!(project.description, placeholder_projects()[0].description);
    }

    #[test]
    fn test_filter_profiles_by_email() {
        let profiles = vec![
            Profile {
                id: "1".to_string(),
                email: Some("Ada@Example.com".to_string()),
                tier: Tier::Admin,
                created_at: None,
            },
            Profile {
                id: "2".to_string(),
                email: Some("grace@navy.mil".to_string()),
                tier: Tier::Free,
                created_at: None,
            },
            Profile {
                id: "3".to_string(),
                email: None,
                tier: Tier::Paid,
                created_at: None,
            },
        ];
        assert_eq!(filter_profiles(&profiles, "").len(), 3);
        let hits = filter_profiles(&profiles, "example");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert!(filter_profiles(&profiles, "nobody").is_empty());
    }

    #[test]
    fn test_created_date_strips_time() {
        let profile = Profile {
            id: "1".to_string(),
            email: None,
            tier: Tier::Free,
            created_at: Some("2024-03-01T10:00:00Z".to_string()),
        };
        assert_eq!(profile.created_date(), Some("2024-03-01"));
    }
}
