//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! runtime. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for the runtime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Runtime mode; controls how much error detail responses expose.
    pub mode: Mode,

    /// Project root directory, handed to plugin `setup` hooks.
    pub root: PathBuf,

    /// Base path stripped from pathnames before route matching
    /// (e.g., "/app" when the site is mounted below the origin root).
    pub base_path: String,

    /// Environment snapshot injected into every request context.
    /// Populated explicitly by the embedder; the runtime never reads
    /// ambient process state during a request.
    pub env: HashMap<String, String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            root: PathBuf::from("."),
            base_path: String::new(),
            env: HashMap::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Runtime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full error detail in responses, dev-oriented plugin hooks active.
    #[default]
    Development,
    /// Opaque error responses; no internal detail leaks to clients.
    Production,
}

impl Mode {
    pub fn is_development(&self) -> bool {
        matches!(self, Mode::Development)
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when RUST_LOG is unset (e.g., "info").
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development_at_repo_root() {
        let config = AppConfig::default();
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.root, PathBuf::from("."));
        assert!(config.base_path.is_empty());
        assert!(config.env.is_empty());
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let config: AppConfig = toml::from_str("mode = \"production\"").unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert!(!config.mode.is_development());
    }
}
