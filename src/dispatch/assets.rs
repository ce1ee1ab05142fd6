//! Virtual asset serving middleware.
//!
//! # Responsibilities
//! - Serve plugin-provided virtual modules over HTTP
//! - Run the registry's resolve → load → transform pipeline per request
//!
//! # Design Decisions
//! - Installed by plugins via `configure_server`, not wired by default
//! - Requests outside the prefix fall through to the rest of the chain
//! - An unresolvable id also falls through, so real assets keep working

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};

use crate::context::RequestContext;
use crate::dispatch::error::Error;
use crate::dispatch::middleware::{Middleware, Next};
use crate::plugin::PluginRegistry;

const DEFAULT_PREFIX: &str = "/@virtual/";

/// Serves module bodies resolved entirely by plugins.
pub struct VirtualAssetMiddleware {
    registry: PluginRegistry,
    prefix: String,
}

impl VirtualAssetMiddleware {
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[async_trait]
impl Middleware for VirtualAssetMiddleware {
    async fn handle(
        &self,
        request: Request<Body>,
        context: RequestContext,
        next: Next<'_>,
    ) -> Result<Response<Body>, Error> {
        let path = context.url().path().to_string();
        let Some(id) = path.strip_prefix(&self.prefix) else {
            return next.run(request, context).await;
        };

        let resolved = self
            .registry
            .resolve_id(id)
            .unwrap_or_else(|| id.to_string());
        match self.registry.load(&resolved).await? {
            Some(code) => {
                let code = self.registry.transform(code, &resolved).await?;
                let mut response = Response::new(Body::from(code));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/javascript"),
                );
                Ok(response)
            }
            None => {
                tracing::debug!(id = %resolved, "no plugin loaded virtual id, falling through");
                next.run(request, context).await
            }
        }
    }
}
