//! Request-scoped context subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → RequestContext::new (parse URL, snapshot env, parse cookies)
//!     → middleware + handlers (store / cache / cookie mutations)
//!     → apply_to_response (headers, Cache-Control, X-Cache-Tags, Set-Cookie)
//! ```
//!
//! # Design Decisions
//! - One context per request; never shared across requests
//! - Cheap to clone (Arc inner) so middleware, handlers, and the
//!   dispatcher observe the same state without lifetime plumbing
//! - Environment is an injected snapshot, not ambient process state
//! - The context only ever originates Cache-Control, X-Cache-Tags, and
//!   Set-Cookie; all other headers come through `response_headers`

pub mod cache;
pub mod cookies;

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response};
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use crate::context::cache::{CacheOptions, CacheState};
use crate::context::cookies::{CookieJar, CookieOptions};

pub use crate::context::cookies::SameSite;

/// Origin used when the request URL cannot be reconstructed.
const FALLBACK_ORIGIN: &str = "http://localhost/";

static X_CACHE_TAGS: HeaderName = HeaderName::from_static("x-cache-tags");

/// Per-request container for cache policy, cookies, ad-hoc key/value
/// storage, and outgoing header accumulation.
///
/// Clones share state: every middleware and handler in one request sees
/// the same context. Contexts are never shared between requests.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

struct Inner {
    url: Url,
    env: HashMap<String, String>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    store: HashMap<String, Value>,
    headers: HeaderMap,
    cache: CacheState,
    cookies: CookieJar,
}

impl RequestContext {
    /// Build a context from an inbound request and an environment
    /// snapshot supplied by configuration.
    pub fn new(request: &Request<Body>, env: HashMap<String, String>) -> Self {
        let url = parse_request_url(request);
        let cookie_header = request
            .headers()
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok());
        let state = State {
            cookies: CookieJar::parse(cookie_header),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                url,
                env,
                state: Mutex::new(state),
            }),
        }
    }

    /// The parsed request URL.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Read a value from the environment snapshot.
    pub fn env(&self, key: &str) -> Option<&str> {
        self.inner.env.get(key).map(String::as_str)
    }

    // --- request-scoped key/value store ---

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.state.lock().store.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.state.lock().store.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.state.lock().store.contains_key(key)
    }

    /// Remove a key, returning whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.state.lock().store.remove(key).is_some()
    }

    // --- outgoing header accumulation ---

    /// Set a header to merge onto the final response, replacing any
    /// previously accumulated values for the same name.
    pub fn set_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.state.lock().headers.insert(name, value);
    }

    /// Accumulate an additional value for a header name.
    pub fn append_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.state.lock().headers.append(name, value);
    }

    // --- cache policy ---

    /// Replace the cache policy; tags on `options` are unioned into the
    /// accumulated set.
    pub fn set_cache(&self, options: CacheOptions) {
        self.inner.state.lock().cache.set(options);
    }

    /// Union tags without touching other cache options.
    pub fn add_cache_tags<S: AsRef<str>>(&self, tags: &[S]) {
        self.inner.state.lock().cache.add_tags(tags);
    }

    /// The last-set policy, or `None` if never set.
    pub fn cache(&self) -> Option<CacheOptions> {
        self.inner.state.lock().cache.get().cloned()
    }

    /// Accumulated invalidation tags, in first-seen order.
    pub fn cache_tags(&self) -> Vec<String> {
        self.inner.state.lock().cache.tags().to_vec()
    }

    /// Render the Cache-Control value, or `None` if no policy was set.
    pub fn build_cache_control_header(&self) -> Option<String> {
        self.inner.state.lock().cache.header_value()
    }

    // --- cookies ---

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.inner.state.lock().cookies.get(name).map(str::to_string)
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.inner.state.lock().cookies.has(name)
    }

    pub fn cookies_all(&self) -> HashMap<String, String> {
        self.inner.state.lock().cookies.all().clone()
    }

    /// Set a cookie: same-request reads see it immediately, and a
    /// Set-Cookie directive is appended to the response.
    pub fn set_cookie(&self, name: &str, value: &str, options: &CookieOptions) {
        self.inner.state.lock().cookies.set(name, value, options);
    }

    /// Delete a cookie and emit an expiring directive.
    pub fn delete_cookie(&self, name: &str, options: &CookieOptions) {
        self.inner.state.lock().cookies.delete(name, options);
    }

    // --- response policy application ---

    /// Produce a response with accumulated headers merged on, cache
    /// policy and tags applied when not already present, and every
    /// pending Set-Cookie directive appended. Status and body are
    /// preserved unchanged.
    pub fn apply_to_response(&self, response: Response<Body>) -> Response<Body> {
        let (mut parts, body) = response.into_parts();
        let state = self.inner.state.lock();

        for name in state.headers.keys() {
            let mut values = state.headers.get_all(name).iter();
            if let Some(first) = values.next() {
                parts.headers.insert(name.clone(), first.clone());
            }
            for value in values {
                parts.headers.append(name.clone(), value.clone());
            }
        }

        if !parts.headers.contains_key(header::CACHE_CONTROL) {
            if let Some(value) = state.cache.header_value() {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    parts.headers.insert(header::CACHE_CONTROL, value);
                }
            }
        }

        if !parts.headers.contains_key(&X_CACHE_TAGS) && !state.cache.tags().is_empty() {
            if let Ok(value) = HeaderValue::from_str(&state.cache.tags().join(",")) {
                parts.headers.insert(X_CACHE_TAGS.clone(), value);
            } else {
                tracing::warn!("cache tags contain non-header-safe characters, skipping");
            }
        }

        for directive in state.cookies.pending() {
            match HeaderValue::from_str(directive) {
                Ok(value) => {
                    parts.headers.append(header::SET_COOKIE, value);
                }
                Err(_) => {
                    tracing::warn!(directive = %directive, "unrepresentable Set-Cookie directive, skipping");
                }
            }
        }

        Response::from_parts(parts, body)
    }
}

/// Reconstruct an absolute URL for the request, falling back to a
/// placeholder origin rather than failing context creation.
fn parse_request_url(request: &Request<Body>) -> Url {
    let uri = request.uri();
    let candidate = if uri.scheme().is_some() {
        uri.to_string()
    } else {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{}{}", host, uri)
    };
    Url::parse(&candidate)
        .unwrap_or_else(|_| Url::parse(FALLBACK_ORIGIN).expect("fallback origin is valid"))
}
