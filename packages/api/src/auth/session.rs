//! Session data kept by the client between requests.

use serde::{Deserialize, Serialize};
use store::AuthSession;

/// Key for storing the session in browser local storage.
pub const SESSION_STORAGE_KEY: &str = "portfolio.auth.session";

/// Session plus the refresh token used to renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: AuthSession,
    pub refresh_token: Option<String>,
}
