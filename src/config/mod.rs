//! Configuration module for pingraph
//!
//! Engine configuration covers the worker substrate, the supervision
//! policy for failed deliveries and logging. It is read from a TOML file
//! (or JSON when the extension is `.json`); every field has a default, so an
//! empty file is a valid configuration.
//!
//! # Config Location
//!
//! [`EngineConfig::load_or_default`] looks in order at:
//! - the path in `PINGRAPH_CONFIG`
//! - `<config dir>/pingraph/engine.toml` (e.g. `~/.config/pingraph/engine.toml` on Linux)
//!
//! # Example
//!
//! ```toml
//! supervision = "log_and_drop"
//!
//! [dispatcher]
//! min_workers = 2
//! max_workers = 16
//! queue = { kind = "bounded", capacity = 1024, overflow = "drop_newest" }
//!
//! [logging]
//! filter = "warn,pingraph=info"
//! file = "pingraph.log"
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{GraphError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config dir
pub const APP_ID: &str = "pingraph";

/// Config filename
pub const CONFIG_FILE: &str = "engine.toml";

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "PINGRAPH_CONFIG";

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dispatcher: DispatcherConfig,
    pub supervision: Supervision,
    pub logging: LoggingConfig,
}

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(GraphError::from)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: EngineConfig = if is_json(path) {
            serde_json::from_str(&text)?
        } else {
            toml::from_str(&text)?
        };
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;

        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Save to a file in the format implied by its extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)
            .map_err(GraphError::from)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Load from `PINGRAPH_CONFIG` or the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let candidate = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);

        match candidate {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to load config, using defaults: {}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let d = &self.dispatcher;
        if d.min_workers == 0 {
            return Err(GraphError::Config(
                "dispatcher.min_workers must be at least 1".to_string(),
            ));
        }
        if d.max_workers < d.min_workers {
            return Err(GraphError::Config(format!(
                "dispatcher.max_workers ({}) is below min_workers ({})",
                d.max_workers, d.min_workers
            )));
        }
        if let QueuePolicy::Bounded { capacity: 0, .. } = d.queue {
            return Err(GraphError::Config(
                "dispatcher.queue.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
