//! Strata request-handling runtime.
//!
//! Turns an inbound HTTP request into a response by running a
//! middleware chain, dispatching to a matched route's loader or action,
//! and applying per-request cache, cookie, and header policy. Route
//! discovery, rendering, and bundling live in external collaborators
//! consumed through the [`routing::RouteMatcher`] and
//! [`plugin::Plugin`] seams.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod observability;
pub mod plugin;
pub mod routing;

pub use config::{AppConfig, Mode};
pub use context::cache::CacheOptions;
pub use context::cookies::CookieOptions;
pub use context::{RequestContext, SameSite};
pub use dispatch::assets::VirtualAssetMiddleware;
pub use dispatch::error::Error;
pub use dispatch::middleware::{Middleware, Next};
pub use dispatch::App;
pub use plugin::{compose, Plugin, PluginContext, PluginRegistry, ServerHooks};
pub use routing::{handler, Handler, HandlerArgs, HandlerOutcome, Route, RouteMatch, RouteModule};
pub use routing::RouteMatcher;
