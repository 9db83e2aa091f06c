//! Configuration for scopectl.
//!
//! Reads `<config dir>/scopectl/config.toml`, with environment variables
//! layered on top (file → environment):
//!
//! ```toml
//! [services]
//! session_url = "https://api.pulseboard.app/session"
//! organizations_url = "https://api.pulseboard.app/organizations"
//! companies_url = "https://api.pulseboard.app/companies"
//! products_url = "https://api.pulseboard.app/products"
//! authorization_url = "https://api.pulseboard.app/authorization"
//!
//! [session]
//! token = "pbs_..."
//!
//! [state]
//! dir = "/var/lib/scopectl"
//! ```
//!
//! Environment overrides: `SCOPECTL_SESSION_URL`, `SCOPECTL_ORGANIZATIONS_URL`,
//! `SCOPECTL_COMPANIES_URL`, `SCOPECTL_PRODUCTS_URL`, `SCOPECTL_AUTHORIZATION_URL`,
//! `SCOPECTL_TOKEN` for the session token, and `SCOPECTL_STATE_DIR` for the
//! persisted-context directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://api.pulseboard.app";

/// Base URLs of the platform microservices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_session_url")]
    pub session_url: String,
    #[serde(default = "default_organizations_url")]
    pub organizations_url: String,
    #[serde(default = "default_companies_url")]
    pub companies_url: String,
    #[serde(default = "default_products_url")]
    pub products_url: String,
    #[serde(default = "default_authorization_url")]
    pub authorization_url: String,
}

fn default_session_url() -> String {
    format!("{DEFAULT_API_BASE}/session")
}

fn default_organizations_url() -> String {
    format!("{DEFAULT_API_BASE}/organizations")
}

fn default_companies_url() -> String {
    format!("{DEFAULT_API_BASE}/companies")
}

fn default_products_url() -> String {
    format!("{DEFAULT_API_BASE}/products")
}

fn default_authorization_url() -> String {
    format!("{DEFAULT_API_BASE}/authorization")
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            session_url: default_session_url(),
            organizations_url: default_organizations_url(),
            companies_url: default_companies_url(),
            products_url: default_products_url(),
            authorization_url: default_authorization_url(),
        }
    }
}

/// Session settings. The token comes from the platform's sign-in flow;
/// scopectl only consumes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub token: Option<String>,
}

/// Local state settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory for the persisted active context. Defaults to
    /// `<data dir>/scopectl` when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub state: StateConfig,
}

impl Config {
    /// Default config file path, `<config dir>/scopectl/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No config directory available on this platform")?;
        Ok(base.join("scopectl").join("config.toml"))
    }

    /// Load from the default path; a missing file yields defaults.
    /// Environment variables override file values either way.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let override_from = |var: &str, slot: &mut String| {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *slot = value;
            }
        };
        override_from("SCOPECTL_SESSION_URL", &mut self.services.session_url);
        override_from(
            "SCOPECTL_ORGANIZATIONS_URL",
            &mut self.services.organizations_url,
        );
        override_from("SCOPECTL_COMPANIES_URL", &mut self.services.companies_url);
        override_from("SCOPECTL_PRODUCTS_URL", &mut self.services.products_url);
        override_from(
            "SCOPECTL_AUTHORIZATION_URL",
            &mut self.services.authorization_url,
        );
        if let Ok(token) = std::env::var("SCOPECTL_TOKEN")
            && !token.is_empty()
        {
            self.session.token = Some(token);
        }
        if let Ok(dir) = std::env::var("SCOPECTL_STATE_DIR")
            && !dir.is_empty()
        {
            self.state.dir = Some(PathBuf::from(dir));
        }
    }

    /// Write this config to the given path, creating parent directories.
    pub fn write_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let toml = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, toml)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}
