//! Authentication against the hosted GoTrue API.

mod gotrue;
mod session;
pub mod storage;

pub use gotrue::{map_auth_status, AuthResponse};
pub use session::{StoredSession, SESSION_STORAGE_KEY};
