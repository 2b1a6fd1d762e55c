//! Plugin-wide settings: request timeout and template search path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::NotifierError;

/// Environment variable overriding the request timeout, in seconds.
const ENV_TIMEOUT_SECS: &str = "WEBHOOK_NOTIFY_TIMEOUT_SECS";

/// Environment variable adding template directories (path-list separated).
const ENV_TEMPLATE_DIR: &str = "WEBHOOK_NOTIFY_TEMPLATE_DIR";

/// Default timeout for webhook requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub timeout_secs: u64,
    /// Searched, in order, for relative `message_template` paths
    pub template_dirs: Vec<PathBuf>,
    pub user_agent: String,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            template_dirs: vec![],
            user_agent: concat!("webhook-notify/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl NotifierSettings {
    /// Parse settings from a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(s: &str) -> Result<Self, NotifierError> {
        let settings: Self = toml::from_str(s).map_err(|e| NotifierError::Parse {
            what: "notifier settings",
            source: Box::new(e),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, NotifierError> {
        let content = std::fs::read_to_string(path).map_err(|e| NotifierError::Parse {
            what: "notifier settings file",
            source: Box::new(e),
        })?;
        debug!(path = %path.display(), "Loaded notifier settings");
        Self::from_toml_str(&content)
    }

    /// Defaults overlaid with `WEBHOOK_NOTIFY_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if the timeout variable is not a positive integer.
    pub fn from_env() -> Result<Self, NotifierError> {
        Self::default().with_env_overrides()
    }

    /// Apply `WEBHOOK_NOTIFY_*` environment variables on top of these settings.
    ///
    /// # Errors
    /// Returns an error if the timeout variable is not a positive integer.
    pub fn with_env_overrides(mut self) -> Result<Self, NotifierError> {
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| NotifierError::Config {
                message: format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"),
            })?;
        }

        if let Some(dirs) = std::env::var_os(ENV_TEMPLATE_DIR) {
            self.template_dirs.extend(std::env::split_paths(&dirs));
        }

        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), NotifierError> {
        if self.timeout_secs == 0 {
            return Err(NotifierError::Config {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
