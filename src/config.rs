//! Bridge configuration parameters
//!
//! All tunables for the asset-pack bridge. Hosts usually ship them as a
//! JSON document next to the plugin; any key may be omitted.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name the plugin registers under with the host
    pub plugin_name: String,

    // --- Dispatch ---
    /// Drop fetch progress updates identical to the last one emitted
    pub coalesce_progress: bool,
    /// Upper bound on operations still waiting for a terminal notification
    pub max_live_operations: usize,
    /// Log every emitted notification at debug level
    pub log_notifications: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            plugin_name: "PlayAssetDelivery".into(),
            coalesce_progress: true,
            max_live_operations: 256,
            log_notifications: true,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plugin_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("plugin_name must not be empty"));
        }
        if self.max_live_operations == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_live_operations must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON or has mistyped keys.
    Corrupted(String),
    /// The document parsed but a value is unusable.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "config validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
