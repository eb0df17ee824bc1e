//! Configuration types for the kiosk session service.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, KioskId, Result};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Service configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KioskConfig {
    /// Kiosk terminal settings
    pub kiosk: KioskSettings,
    /// Persistent store settings
    pub backend: BackendSettings,
}

impl KioskConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: KioskConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.kiosk.kiosk_id()?;

        if !LOG_LEVELS.contains(&self.kiosk.log_level.as_str()) {
            return Err(Error::Config(format!(
                "kiosk.log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.kiosk.log_level
            )));
        }

        if self.backend.kind == BackendKind::Rest {
            let url = self
                .backend
                .url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| Error::Config("backend.url is required for rest".to_string()))?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "backend.url must be an http(s) URL, got '{url}'"
                )));
            }
            if self
                .backend
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
            {
                return Err(Error::Config(
                    "backend.api_key is required for rest".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Kiosk terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskSettings {
    /// Kiosk identifier (None = let the store assign its default)
    pub kiosk_id: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for KioskSettings {
    fn default() -> Self {
        Self {
            kiosk_id: None,
            log_level: "info".to_string(),
        }
    }
}

impl KioskSettings {
    /// Validated kiosk identifier, if one is configured.
    pub fn kiosk_id(&self) -> Result<Option<KioskId>> {
        self.kiosk_id.clone().map(KioskId::new).transpose()
    }
}

/// Which session store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, lost on exit
    #[default]
    Memory,
    /// Managed backend over its REST interface
    Rest,
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendSettings {
    /// Store implementation
    pub kind: BackendKind,
    /// Backend project URL (rest only)
    pub url: Option<String>,
    /// Public API key sent with every request (rest only)
    pub api_key: Option<String>,
    /// User access token; falls back to the API key when absent
    pub access_token: Option<String>,
}
