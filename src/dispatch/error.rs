//! Error taxonomy and HTTP classification.
//!
//! # Responsibilities
//! - Define the runtime error type for middleware, handlers, and plugins
//! - Map errors to HTTP responses exactly once, at the top of dispatch
//! - Expose internal detail only in development mode
//!
//! # Design Decisions
//! - "Not found" is an enum variant carrying optional diagnostic data,
//!   not a thrown exception
//! - Configuration mistakes (no matcher, no module) are direct 500
//!   responses built in route dispatch, not errors
//! - Production responses never leak messages or detail

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::schema::Mode;

/// Runtime error raised by middleware, handlers, or plugin hooks.
#[derive(Debug, Error)]
pub enum Error {
    /// Distinguished not-found signal, optionally carrying diagnostic
    /// data that is echoed in the 404 body.
    #[error("Not Found")]
    NotFound { data: Option<Value> },

    /// A fault from a handler or middleware. `detail` holds flattened
    /// underlying-cause information, shown only in development mode.
    #[error("{message}")]
    Handler {
        message: String,
        detail: Option<String>,
    },

    /// A plugin lifecycle hook failed.
    #[error("plugin '{plugin}': {message}")]
    Plugin { plugin: String, message: String },

    /// A plugin was registered without a usable name.
    #[error("plugin has no name")]
    UnnamedPlugin,
}

impl Error {
    pub fn not_found() -> Self {
        Error::NotFound { data: None }
    }

    pub fn not_found_with(data: Value) -> Self {
        Error::NotFound { data: Some(data) }
    }

    /// Wrap an arbitrary fault message.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler {
            message: message.into(),
            detail: None,
        }
    }

    /// Wrap a fault with flattened cause detail.
    pub fn handler_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Handler {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub(crate) fn plugin(plugin: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: error.to_string(),
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            Error::Handler { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::handler_with_detail("serialization failed", error.to_string())
    }
}

/// Classify an error into the response sent to the client.
pub(crate) fn error_response(error: &Error, mode: Mode) -> Response<Body> {
    match error {
        Error::NotFound { data } => {
            let mut body = serde_json::Map::new();
            body.insert("error".to_string(), json!("Not Found"));
            if let Some(data) = data {
                body.insert("data".to_string(), data.clone());
            }
            json_response(StatusCode::NOT_FOUND, &Value::Object(body))
        }
        other if mode.is_development() => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({
                "error": other.to_string(),
                "detail": other.detail(),
            }),
        ),
        _ => text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
    }
}

/// Infallible JSON response constructor.
pub(crate) fn json_response(status: StatusCode, value: &Value) -> Response<Body> {
    let body = serde_json::to_string(value)
        .unwrap_or_else(|_| "{\"error\":\"Internal Server Error\"}".to_string());
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Infallible plain-text response constructor.
pub(crate) fn text_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
