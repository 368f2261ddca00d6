//! # Application configuration — `portfolio.toml`
//!
//! Tells the app which hosted backend project to talk to and how the public
//! pages behave when it cannot be reached.
//!
//! ## Structure
//!
//! ```toml
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "public-anon-key"
//!
//! [ui]
//! placeholder_projects = true   # show built-in projects when loading fails
//! ```
//!
//! ## Sources
//!
//! | Constructor | Reads |
//! |-------------|-------|
//! | [`PortfolioConfig::from_toml`] | A TOML document. |
//! | [`PortfolioConfig::from_env`] | Runtime `PORTFOLIO_BACKEND_URL` / `PORTFOLIO_BACKEND_ANON_KEY` (native builds load `.env` first). |
//! | [`PortfolioConfig::from_build_env`] | The same variables captured at compile time; used by the browser build. |
//!
//! An empty url or key means the backend is not configured. The app still
//! runs: sign-in reports the backend as unavailable and the project list falls
//! back to placeholders.

use serde::{Deserialize, Serialize};

pub const URL_VAR: &str = "PORTFOLIO_BACKEND_URL";
pub const ANON_KEY_VAR: &str = "PORTFOLIO_BACKEND_ANON_KEY";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Hosted backend connection details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Both values present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

/// Presentation switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_placeholder_projects")]
    pub placeholder_projects: bool,
}

fn default_placeholder_projects() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            placeholder_projects: default_placeholder_projects(),
        }
    }
}

impl PortfolioConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "portfolio.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Overlay values from the given variable lookup. Unset variables keep
    /// the current value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(URL_VAR) {
            self.backend.url = url;
        }
        if let Some(key) = lookup(ANON_KEY_VAR) {
            self.backend.anon_key = key;
        }
        self
    }

    /// Default config overlaid with the process environment.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Default config overlaid with variables captured at build time.
    pub fn from_build_env() -> Self {
        Self::default().with_overrides(|name| match name {
            URL_VAR => option_env!("PORTFOLIO_BACKEND_URL").map(str::to_string),
            ANON_KEY_VAR => option_env!("PORTFOLIO_BACKEND_ANON_KEY").map(str::to_string),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = PortfolioConfig::from_toml("").unwrap();
        assert_eq!(config, PortfolioConfig::default());
        assert!(config.ui.placeholder_projects);
        assert!(!config.backend.is_configured());
    }

    #[test]
    fn test_parse_backend_section() {
        let config = PortfolioConfig::from_toml(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"

            [ui]
            placeholder_projects = false
            "#,
        )
        .unwrap();
        assert!(config.backend.is_configured());
        assert_eq!(config.backend.url, "https://demo.supabase.co");
        assert!(!config.ui.placeholder_projects);

        let roundtrip = PortfolioConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(roundtrip, config);
    }

    #[test]
    fn test_overrides_replace_only_set_values() {
        let base = PortfolioConfig {
            backend: BackendConfig::new("https://file.example", "file-key"),
            ui: UiConfig::default(),
        };
        let config = base.with_overrides(|name| {
            (name == URL_VAR).then(|| "https://env.example".to_string())
        });
        assert_eq!(config.backend.url, "https://env.example");
        assert_eq!(config.backend.anon_key, "file-key");
    }

    #[test]
    fn test_blank_values_are_not_configured() {
        assert!(!BackendConfig::new("  ", "key").is_configured());
        assert!(!BackendConfig::new("https://x", "").is_configured());
    }
}
