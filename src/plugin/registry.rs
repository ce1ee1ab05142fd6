//! Ordered plugin collection with lifecycle fan-out.
//!
//! # Responsibilities
//! - Hold registered plugins in registration order
//! - Fire `setup` immediately on registration
//! - Chain `transform`, short-circuit `resolve_id`/`load`
//! - Fan out `configure_server`/`build_start`/`build_end` sequentially
//!
//! # Design Decisions
//! - Duplicate names are skipped with a warning, not an error
//! - A failing `setup` propagates; the plugin stays in the list since it
//!   was appended before the hook ran
//! - Cheap to clone (Arc inner) so request-time middleware can query the
//!   same registry the dispatcher owns; mutation is configuration-time only

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dispatch::error::Error;
use crate::plugin::{Plugin, PluginContext, ServerHooks};

/// One per dispatcher instance; lifecycle tied to it.
#[derive(Clone)]
pub struct PluginRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
    context: PluginContext,
}

impl PluginRegistry {
    pub fn new(context: PluginContext) -> Self {
        Self {
            inner: Arc::new(Inner {
                plugins: RwLock::new(Vec::new()),
                context,
            }),
        }
    }

    /// The shared context passed to every `setup` call.
    pub fn context(&self) -> &PluginContext {
        &self.inner.context
    }

    pub fn len(&self) -> usize {
        self.inner.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.plugins.read().is_empty()
    }

    /// Registered plugin names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|p| p.name().to_string()).collect()
    }

    /// Append a plugin and fire its `setup` hook.
    pub async fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), Error> {
        let name = plugin.name().to_string();
        if name.is_empty() {
            return Err(Error::UnnamedPlugin);
        }
        {
            let mut plugins = self.inner.plugins.write();
            if plugins.iter().any(|registered| registered.name() == name) {
                tracing::warn!(plugin = %name, "duplicate plugin name, ignoring registration");
                return Ok(());
            }
            plugins.push(plugin.clone());
        }
        plugin
            .setup(&self.inner.context)
            .await
            .map_err(|error| Error::plugin(&name, error))?;
        tracing::debug!(plugin = %name, "plugin registered");
        Ok(())
    }

    /// Register plugins sequentially, in order.
    pub async fn register_all(&self, plugins: Vec<Arc<dyn Plugin>>) -> Result<(), Error> {
        for plugin in plugins {
            self.register(plugin).await?;
        }
        Ok(())
    }

    /// Pipe `code` through every plugin's `transform` in registration
    /// order. A `None` result keeps the previous code.
    pub async fn transform(&self, code: impl Into<String>, id: &str) -> Result<String, Error> {
        let mut code = code.into();
        for plugin in self.snapshot() {
            if let Some(next) = plugin.transform(&code, id).await? {
                code = next;
            }
        }
        Ok(code)
    }

    /// First non-None `resolve_id` result wins.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.snapshot().iter().find_map(|plugin| plugin.resolve_id(id))
    }

    /// First non-None `load` result wins; later plugins are not asked.
    pub async fn load(&self, id: &str) -> Result<Option<String>, Error> {
        for plugin in self.snapshot() {
            if let Some(body) = plugin.load(id).await? {
                return Ok(Some(body));
            }
        }
        Ok(None)
    }

    /// Sequential fan-out; the first error aborts remaining plugins.
    pub async fn configure_server(&self, server: &mut ServerHooks) -> Result<(), Error> {
        for plugin in self.snapshot() {
            plugin.configure_server(server).await?;
        }
        Ok(())
    }

    pub async fn build_start(&self) -> Result<(), Error> {
        for plugin in self.snapshot() {
            plugin.build_start().await?;
        }
        Ok(())
    }

    pub async fn build_end(&self) -> Result<(), Error> {
        for plugin in self.snapshot() {
            plugin.build_end().await?;
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.inner.plugins.read().clone()
    }
}
