//! Terminal route dispatch.
//!
//! # Responsibilities
//! - Strip the configured base path from the pathname
//! - Look up the route via the matcher seam
//! - Select loader vs action by effective method and invoke it
//! - Serialize handler data; degrade serialization faults to 500
//!
//! # Design Decisions
//! - Missing matcher / unloaded module are configuration mistakes and
//!   produce direct 500s rather than errors
//! - An Accept header asking for application/json gets raw loader data;
//!   anything else gets the `{loaderData, params}` envelope consumed by
//!   the external renderer
//! - HEAD is treated as a read like GET; body stripping is the
//!   transport's concern

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, Response, StatusCode};
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::dispatch::error::{json_response, text_response, Error};
use crate::dispatch::middleware::Terminal;
use crate::routing::matcher::RouteMatcher;
use crate::routing::route::{HandlerArgs, HandlerOutcome};

/// The chain's terminal step for one request.
pub(crate) struct RouteDispatch<'a> {
    pub matcher: Option<&'a dyn RouteMatcher>,
    pub base_path: &'a str,
    /// Effective method (after any `_method` override).
    pub method: Method,
}

#[async_trait]
impl Terminal for RouteDispatch<'_> {
    async fn dispatch(
        &self,
        request: Request<Body>,
        context: RequestContext,
    ) -> Result<Response<Body>, Error> {
        let pathname = strip_base_path(context.url().path(), self.base_path);

        let Some(matcher) = self.matcher else {
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Router not configured",
            ));
        };
        let Some(matched) = matcher.match_path(&pathname) else {
            return Ok(text_response(StatusCode::NOT_FOUND, "Not Found"));
        };
        let Some(module) = matched.route.module.clone() else {
            tracing::error!(route = %matched.route.id, "route matched but module not loaded");
            return Ok(text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Route module not loaded",
            ));
        };

        if self.method != Method::GET && self.method != Method::HEAD {
            let Some(action) = module.handler_for(&self.method).cloned() else {
                return Ok(text_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "Method Not Allowed",
                ));
            };
            let outcome = action(HandlerArgs {
                request,
                params: matched.params.clone(),
                context,
            })
            .await?;
            return Ok(match outcome {
                HandlerOutcome::Response(response) => response,
                HandlerOutcome::Data(value) => data_response(&value),
                HandlerOutcome::None => data_response(&Value::Null),
            });
        }

        let wants_data = wants_structured_data(request.headers());
        let loader_data = match module.loader.clone() {
            Some(loader) => {
                let outcome = loader(HandlerArgs {
                    request,
                    params: matched.params.clone(),
                    context,
                })
                .await?;
                match outcome {
                    HandlerOutcome::Response(response) => return Ok(response),
                    HandlerOutcome::Data(value) => value,
                    HandlerOutcome::None => Value::Null,
                }
            }
            None => Value::Null,
        };

        if wants_data {
            return Ok(data_response(&loader_data));
        }

        // Full-page rendering belongs to the external renderer; hand it
        // the envelope it hydrates from.
        let envelope = json!({
            "loaderData": loader_data,
            "params": matched.params,
        });
        Ok(data_response(&envelope))
    }
}

/// JSON-serialize handler data, degrading serialization faults to a 500
/// JSON envelope instead of letting them escape.
fn data_response(value: &Value) -> Response<Body> {
    match serde_json::to_string(value) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                axum::http::HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to serialize handler data");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({"error": "Failed to serialize response"}),
            )
        }
    }
}

fn wants_structured_data(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Strip a configured base path, leaving the pathname unmodified when it
/// does not sit under the base.
pub(crate) fn strip_base_path(pathname: &str, base_path: &str) -> String {
    let base = normalize_base(base_path);
    if base.is_empty() || base == "/" {
        return pathname.to_string();
    }
    match pathname.strip_prefix(&base) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => pathname.to_string(),
    }
}

/// Collapse repeated slashes and trim the trailing slash.
fn normalize_base(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut previous_slash = false;
    for ch in base.chars() {
        if ch == '/' {
            if !previous_slash {
                out.push('/');
            }
            previous_slash = true;
        } else {
            out.push(ch);
            previous_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
