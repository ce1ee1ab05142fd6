//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → App::handle (fresh RequestContext, effective method)
//!     → middleware chain (registration order, may short-circuit)
//!     → route dispatch (base path, matcher, loader/action)
//!     → error classification (404 / 500, mode-aware detail)
//!     → RequestContext::apply_to_response (headers, cache, cookies)
//! ```
//!
//! # Design Decisions
//! - Routes, middleware, and plugins are mutated only through `&mut self`
//!   before serving; `handle` takes `&self`, so concurrent requests
//!   cannot race configuration
//! - Errors are caught exactly once, at the top of `handle`
//! - Response policy is applied on success and error paths alike

pub mod assets;
pub mod error;
pub mod method;
pub mod middleware;
pub mod route;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use uuid::Uuid;

use crate::config::schema::AppConfig;
use crate::context::RequestContext;
use crate::dispatch::error::Error;
use crate::dispatch::middleware::{Middleware, Next};
use crate::dispatch::route::RouteDispatch;
use crate::observability::metrics;
use crate::plugin::{Plugin, PluginContext, PluginRegistry, ServerHooks};
use crate::routing::matcher::RouteMatcher;
use crate::routing::route::Route;

/// The dispatcher: owns configuration, routes, middleware, and the
/// plugin registry, and turns requests into responses.
pub struct App {
    config: AppConfig,
    routes: Vec<Route>,
    matcher: Option<Box<dyn RouteMatcher>>,
    middleware: Vec<Arc<dyn Middleware>>,
    plugins: PluginRegistry,
    pending_plugins: Vec<Arc<dyn Plugin>>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let plugins = PluginRegistry::new(PluginContext::new(config.clone()));
        Self {
            config,
            routes: Vec::new(),
            matcher: None,
            middleware: Vec::new(),
            plugins,
            pending_plugins: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Queue a plugin. Registration (and its `setup` hook) happens when
    /// a lifecycle entry point runs.
    pub fn use_plugin(&mut self, plugin: Arc<dyn Plugin>) -> &mut Self {
        self.pending_plugins.push(plugin);
        self
    }

    /// Append a middleware to the chain.
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Install or replace the route matcher. Affects only requests
    /// dispatched afterward.
    pub fn set_route_matcher(&mut self, matcher: impl RouteMatcher + 'static) -> &mut Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    pub fn set_routes(&mut self, routes: Vec<Route>) -> &mut Self {
        self.routes = routes;
        self
    }

    /// Start the development server: register pending plugins, then let
    /// them install server hooks.
    pub async fn dev(&mut self) -> Result<(), Error> {
        self.ensure_plugins().await?;
        self.run_configure_server().await
    }

    /// Start the production server: register pending plugins, then let
    /// them install server hooks.
    pub async fn start(&mut self) -> Result<(), Error> {
        self.ensure_plugins().await?;
        self.run_configure_server().await
    }

    /// Run a build: `build_start` fans out, the external bundler does
    /// the actual work, and `build_end` fans out afterward even when the
    /// bundler fails.
    pub async fn build<F, Fut>(&mut self, bundler: F) -> Result<(), Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        self.ensure_plugins().await?;
        self.plugins.build_start().await?;
        let built = bundler().await;
        let ended = self.plugins.build_end().await;
        built.and(ended)
    }

    /// The single request-processing entry point.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        let context = RequestContext::new(&request, self.config.env.clone());
        let (method, request) = method::effective_method(request).await;

        tracing::debug!(
            request_id = %request_id,
            method = %request.method(),
            effective_method = %method,
            path = %context.url().path(),
            "dispatching request"
        );

        let terminal = RouteDispatch {
            matcher: self.matcher.as_deref(),
            base_path: &self.config.base_path,
            method: method.clone(),
        };
        let chain = Next {
            middleware: &self.middleware,
            terminal: &terminal,
        };

        let response = match chain.run(request, context.clone()).await {
            Ok(response) => response,
            Err(error) => {
                match &error {
                    Error::NotFound { .. } => {
                        tracing::debug!(request_id = %request_id, "handler signaled not found");
                    }
                    other => {
                        tracing::error!(request_id = %request_id, error = %other, "request failed");
                    }
                }
                error::error_response(&error, self.config.mode)
            }
        };

        let response = context.apply_to_response(response);
        metrics::record_request(method.as_str(), response.status().as_u16(), started);
        tracing::debug!(
            request_id = %request_id,
            status = %response.status(),
            "request complete"
        );
        response
    }

    /// Register every queued plugin, in queue order.
    async fn ensure_plugins(&mut self) -> Result<(), Error> {
        let pending = std::mem::take(&mut self.pending_plugins);
        self.plugins.register_all(pending).await
    }

    async fn run_configure_server(&mut self) -> Result<(), Error> {
        let mut hooks = ServerHooks::default();
        self.plugins.configure_server(&mut hooks).await?;
        self.middleware.extend(hooks.into_middleware());
        Ok(())
    }
}
