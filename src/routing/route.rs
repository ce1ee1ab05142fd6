//! Route definitions and handler types.
//!
//! # Responsibilities
//! - Describe a route (identifier, pattern, optionally loaded module)
//! - Describe a match (route + extracted params + resolved pathname)
//! - Type the loader/action/method handlers a module exposes
//!
//! # Design Decisions
//! - Handlers are boxed async closures; the module-loading collaborator
//!   attaches them at configuration time
//! - Method-specific handlers are consulted before the generic action
//! - A handler either returns a full response (sent verbatim) or data
//!   the dispatcher serializes

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::context::RequestContext;
use crate::dispatch::error::Error;

/// Arguments passed to every loader, action, and method handler.
pub struct HandlerArgs {
    pub request: Request<Body>,
    pub params: HashMap<String, String>,
    pub context: RequestContext,
}

/// What a handler produced.
pub enum HandlerOutcome {
    /// A complete HTTP response, returned to the client verbatim.
    Response(Response<Body>),
    /// Data for the dispatcher to JSON-serialize.
    Data(Value),
    /// No value; normalized to JSON null.
    None,
}

/// A loader, action, or method-specific handler.
pub type Handler =
    Arc<dyn Fn(HandlerArgs) -> BoxFuture<'static, Result<HandlerOutcome, Error>> + Send + Sync>;

/// Box an async closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(HandlerArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutcome, Error>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

/// The loaded code backing a route.
#[derive(Clone, Default)]
pub struct RouteModule {
    /// Read-path handler for GET/HEAD requests.
    pub loader: Option<Handler>,
    /// Write-path handler for other methods.
    pub action: Option<Handler>,
    /// Method-specific handlers; take precedence over `action`.
    pub methods: HashMap<Method, Handler>,
}

impl RouteModule {
    pub fn with_loader(mut self, loader: Handler) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_action(mut self, action: Handler) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_method(mut self, method: Method, handler: Handler) -> Self {
        self.methods.insert(method, handler);
        self
    }

    /// Select the write-path handler for a method: the method-specific
    /// handler if present, otherwise the generic action.
    pub fn handler_for(&self, method: &Method) -> Option<&Handler> {
        self.methods.get(method).or(self.action.as_ref())
    }
}

/// A registered route.
#[derive(Clone)]
pub struct Route {
    /// Identifier used in logs.
    pub id: String,
    /// URL pattern, as understood by the external router.
    pub pattern: String,
    /// Module attached by the module-loading collaborator, if loaded.
    pub module: Option<Arc<RouteModule>>,
}

impl Route {
    pub fn new(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            module: None,
        }
    }

    pub fn with_module(mut self, module: RouteModule) -> Self {
        self.module = Some(Arc::new(module));
        self
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("loaded", &self.module.is_some())
            .finish()
    }
}

/// The pairing of a matched route with extracted path parameters.
#[derive(Clone, Debug)]
pub struct RouteMatch {
    pub route: Route,
    pub params: HashMap<String, String>,
    pub pathname: String,
}
