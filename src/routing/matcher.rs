//! Route matching seam.
//!
//! # Responsibilities
//! - Define the interface the external router collaborator implements
//! - Accept plain closures so tests and embedders can supply either
//!
//! # Design Decisions
//! - Matching is synchronous: `pathname -> Option<RouteMatch>`
//! - The dispatcher never inspects route patterns itself

use crate::routing::route::RouteMatch;

/// Supplied by the router collaborator; maps a pathname to a match.
pub trait RouteMatcher: Send + Sync {
    fn match_path(&self, pathname: &str) -> Option<RouteMatch>;
}

impl<F> RouteMatcher for F
where
    F: Fn(&str) -> Option<RouteMatch> + Send + Sync,
{
    fn match_path(&self, pathname: &str) -> Option<RouteMatch> {
        self(pathname)
    }
}
