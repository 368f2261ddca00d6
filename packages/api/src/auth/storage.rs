//! Session persistence.
//!
//! In the browser the session survives reloads in local storage, the way the
//! hosted client library keeps it. Native builds keep it in memory only.

use super::session::StoredSession;
#[cfg(target_arch = "wasm32")]
use super::session::SESSION_STORAGE_KEY;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(target_arch = "wasm32")]
pub fn load() -> Option<StoredSession> {
    let raw = local_storage()?.get_item(SESSION_STORAGE_KEY).ok()??;
    match serde_json::from_str(&raw) {
        Ok(stored) => Some(stored),
        Err(e) => {
            tracing::warn!("Discarding unreadable stored session: {}", e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save(stored: Option<&StoredSession>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let result = match stored.map(serde_json::to_string) {
        Some(Ok(raw)) => storage.set_item(SESSION_STORAGE_KEY, &raw),
        Some(Err(e)) => {
            tracing::warn!("Could not serialize session: {}", e);
            return;
        }
        None => storage.remove_item(SESSION_STORAGE_KEY),
    };
    if result.is_err() {
        tracing::warn!("Could not write session to local storage");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load() -> Option<StoredSession> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save(_stored: Option<&StoredSession>) {}
