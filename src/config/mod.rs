//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file (optional)
//!     → loader.rs (parse)
//!     → validation.rs (semantic checks, all errors reported)
//!     → AppConfig accepted by App::new
//!
//! At runtime:
//!     AppConfig.env → snapshot injected into every RequestContext
//!     AppConfig.mode → error detail exposure, plugin context
//!     AppConfig.base_path → stripped before route matching
//! ```
//!
//! # Design Decisions
//! - Configuration is immutable once the App starts handling requests
//! - The environment snapshot is an explicit config value, never read
//!   from ambient process state at request time
//! - Validation is a pure function returning every violation at once

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, Mode, ObservabilityConfig};
