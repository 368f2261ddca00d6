pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod remote;

mod memory;
pub use memory::{MemoryStore, Op, WritePolicy};

pub use config::{BackendConfig, PortfolioConfig};
pub use error::{AuthError, DataError};
pub use models::{
    filter_profiles, placeholder_projects, AuthSession, Credentials, Identity, Profile,
    ProfileDraft, Project, ProjectDraft, ProjectForm, ProjectPatch, Tier, TierPatch,
};
pub use query::{Direction, Filter, Order, Query};
pub use remote::{
    fetch_all, fetch_one, AuthBackend, AuthEvent, AuthSubscription, RemoteStore, Resource,
    SignUpOutcome,
};
