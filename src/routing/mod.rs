//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Pathname (base path already stripped)
//!     → matcher.rs (RouteMatcher seam, supplied by the router collaborator)
//!     → Return: RouteMatch { route, params, pathname } or no match
//!
//! Matched route
//!     → route.rs (module lookup: loader / action / method handlers)
//! ```
//!
//! # Design Decisions
//! - Route discovery and pattern matching live outside this crate; the
//!   dispatcher only consumes the `RouteMatcher` seam
//! - Route modules are attached by the module-loading collaborator
//!   before a request can be dispatched to them
//! - Swapping the matcher affects only requests dispatched afterward

pub mod matcher;
pub mod route;

pub use matcher::RouteMatcher;
pub use route::{handler, Handler, HandlerArgs, HandlerOutcome, Route, RouteMatch, RouteModule};
