//! Plugin pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration time:
//!     use_plugin → PluginRegistry::register (setup fires immediately)
//!     dev/start  → configure_server fan-out (plugins install middleware)
//!     build      → build_start → bundler collaborator → build_end
//!
//! Request time:
//!     virtual asset request → resolve_id → load → transform → response
//! ```
//!
//! # Design Decisions
//! - Every hook is optional; default implementations are no-ops
//! - Hooks run strictly in registration order
//! - resolve_id/load short-circuit on the first non-None result;
//!   transform pipes code through every plugin
//! - A composed plugin is indistinguishable from a primitive one

pub mod compose;
pub mod registry;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::schema::{AppConfig, Mode};
use crate::dispatch::error::Error;
use crate::dispatch::middleware::Middleware;

pub use compose::compose;
pub use registry::PluginRegistry;

/// Shared context handed to every plugin's `setup` hook.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub config: AppConfig,
    pub mode: Mode,
    pub root: PathBuf,
}

impl PluginContext {
    pub fn new(config: AppConfig) -> Self {
        let mode = config.mode;
        let root = config.root.clone();
        Self { config, mode, root }
    }
}

/// Hooks a plugin may install on the server at configuration time.
#[derive(Default)]
pub struct ServerHooks {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ServerHooks {
    /// Install a middleware; it runs after all embedder-registered
    /// middleware, in plugin registration order.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middleware.push(Arc::new(middleware));
    }

    pub(crate) fn into_middleware(self) -> Vec<Arc<dyn Middleware>> {
        self.middleware
    }
}

/// A set of optional lifecycle callbacks. The registry holds plugins by
/// reference and only ever invokes them; it never mutates them.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique name within a registry. An empty name fails registration.
    fn name(&self) -> &str;

    /// Fired immediately when the plugin is registered.
    async fn setup(&self, _context: &PluginContext) -> Result<(), Error> {
        Ok(())
    }

    /// Transform module code. `None` means "no change, keep previous".
    async fn transform(&self, _code: &str, _id: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }

    /// Resolve an import specifier. First non-None across the registry wins.
    fn resolve_id(&self, _id: &str) -> Option<String> {
        None
    }

    /// Load a (possibly virtual) module body. First non-None wins.
    async fn load(&self, _id: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }

    /// Install server hooks; called from `dev`/`start`.
    async fn configure_server(&self, _server: &mut ServerHooks) -> Result<(), Error> {
        Ok(())
    }

    /// Called before the bundler collaborator runs a build.
    async fn build_start(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Called after the bundler collaborator finishes a build.
    async fn build_end(&self) -> Result<(), Error> {
        Ok(())
    }
}
