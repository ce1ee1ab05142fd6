//! Plugin composition.
//!
//! Wraps an ordered set of plugins into a single synthetic plugin whose
//! hooks fan out with the same chaining and short-circuit rules as the
//! registry, so a composed plugin is indistinguishable from a primitive
//! one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::error::Error;
use crate::plugin::{Plugin, PluginContext, ServerHooks};

/// Compose plugins into one, preserving their order.
pub fn compose(name: impl Into<String>, plugins: Vec<Arc<dyn Plugin>>) -> Arc<dyn Plugin> {
    Arc::new(Composed {
        name: name.into(),
        plugins,
    })
}

struct Composed {
    name: String,
    plugins: Vec<Arc<dyn Plugin>>,
}

#[async_trait]
impl Plugin for Composed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self, context: &PluginContext) -> Result<(), Error> {
        for plugin in &self.plugins {
            plugin.setup(context).await?;
        }
        Ok(())
    }

    async fn transform(&self, code: &str, id: &str) -> Result<Option<String>, Error> {
        // None only when no wrapped plugin changed anything, matching
        // the "no change" contract of a primitive transform hook.
        let mut current: Option<String> = None;
        for plugin in &self.plugins {
            let input = current.as_deref().unwrap_or(code);
            if let Some(next) = plugin.transform(input, id).await? {
                current = Some(next);
            }
        }
        Ok(current)
    }

    fn resolve_id(&self, id: &str) -> Option<String> {
        self.plugins.iter().find_map(|plugin| plugin.resolve_id(id))
    }

    async fn load(&self, id: &str) -> Result<Option<String>, Error> {
        for plugin in &self.plugins {
            if let Some(body) = plugin.load(id).await? {
                return Ok(Some(body));
            }
        }
        Ok(None)
    }

    async fn configure_server(&self, server: &mut ServerHooks) -> Result<(), Error> {
        for plugin in &self.plugins {
            plugin.configure_server(server).await?;
        }
        Ok(())
    }

    async fn build_start(&self) -> Result<(), Error> {
        for plugin in &self.plugins {
            plugin.build_start().await?;
        }
        Ok(())
    }

    async fn build_end(&self) -> Result<(), Error> {
        for plugin in &self.plugins {
            plugin.build_end().await?;
        }
        Ok(())
    }
}
