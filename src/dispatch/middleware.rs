//! Middleware chain execution.
//!
//! # Responsibilities
//! - Thread `(request, context)` through middleware in registration order
//! - End the chain at the terminal route-dispatch step
//!
//! # Design Decisions
//! - `Next::run` consumes `self`: invoking a spent chain step twice is a
//!   compile error, not a runtime double-dispatch
//! - A middleware that returns without calling `next` short-circuits the
//!   rest of the chain and the route handler
//! - Middleware may catch around its own `next` call to transform
//!   downstream errors into custom responses

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};

use crate::context::RequestContext;
use crate::dispatch::error::Error;

/// A single middleware step. Return a response directly to
/// short-circuit, or delegate with `next.run(..)` and optionally
/// transform its result.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        request: Request<Body>,
        context: RequestContext,
        next: Next<'_>,
    ) -> Result<Response<Body>, Error>;
}

/// The terminal step a chain ends at (route dispatch in production;
/// tests substitute their own).
#[async_trait]
pub(crate) trait Terminal: Send + Sync {
    async fn dispatch(
        &self,
        request: Request<Body>,
        context: RequestContext,
    ) -> Result<Response<Body>, Error>;
}

/// The remainder of the chain. Consumed on use.
pub struct Next<'a> {
    pub(crate) middleware: &'a [Arc<dyn Middleware>],
    pub(crate) terminal: &'a (dyn Terminal + 'a),
}

impl<'a> Next<'a> {
    /// Run the rest of the chain: the next middleware if any remain,
    /// otherwise the terminal step.
    pub async fn run(
        self,
        request: Request<Body>,
        context: RequestContext,
    ) -> Result<Response<Body>, Error> {
        match self.middleware.split_first() {
            Some((current, rest)) => {
                current
                    .handle(
                        request,
                        context,
                        Next {
                            middleware: rest,
                            terminal: self.terminal,
                        },
                    )
                    .await
            }
            None => self.terminal.dispatch(request, context).await,
        }
    }
}
