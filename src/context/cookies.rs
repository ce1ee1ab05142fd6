//! Cookie parsing and Set-Cookie directive construction.
//!
//! # Responsibilities
//! - Parse the inbound Cookie header into a name→value map
//! - Build outbound Set-Cookie directive strings
//! - Keep same-request reads consistent with writes
//!
//! # Design Decisions
//! - Malformed pairs are skipped, never fail the whole parse
//! - A value that fails percent-decoding is kept raw
//! - HttpOnly is on unless explicitly disabled
//! - Every `set` appends a directive; conforming clients apply the last

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// SameSite attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes for an outbound cookie directive.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// Max-Age in seconds.
    pub max_age: Option<i64>,

    /// Absolute expiry, rendered as an HTTP-date.
    pub expires: Option<DateTime<Utc>>,

    /// Cookie path; defaults to "/".
    pub path: Option<String>,

    pub domain: Option<String>,

    /// Defaults to on when unset.
    pub http_only: Option<bool>,

    pub secure: bool,

    pub same_site: Option<SameSite>,
}

/// Inbound cookie map plus pending outbound directives.
#[derive(Debug, Default)]
pub(crate) struct CookieJar {
    values: HashMap<String, String>,
    pending: Vec<String>,
}

impl CookieJar {
    /// Parse an inbound Cookie header. Pairs without '=' or with an
    /// empty name are skipped.
    pub fn parse(header: Option<&str>) -> Self {
        let mut values = HashMap::new();
        if let Some(header) = header {
            for pair in header.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim();
                let decoded = urlencoding::decode(value)
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                values.insert(name.to_string(), decoded);
            }
        }
        Self {
            values,
            pending: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Record a cookie: visible to same-request reads immediately, and
    /// appended as a Set-Cookie directive on the response.
    pub fn set(&mut self, name: &str, value: &str, options: &CookieOptions) {
        self.values.insert(name.to_string(), value.to_string());
        self.pending.push(build_directive(name, value, options));
    }

    /// Remove a cookie and emit an expiring directive for it.
    pub fn delete(&mut self, name: &str, options: &CookieOptions) {
        self.values.remove(name);
        let expiring = CookieOptions {
            max_age: Some(0),
            expires: None,
            path: options.path.clone(),
            domain: options.domain.clone(),
            http_only: options.http_only,
            secure: options.secure,
            same_site: None,
        };
        self.pending.push(build_directive(name, "", &expiring));
    }

    /// Directives waiting to be applied to the response, in order.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }
}

fn build_directive(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut directive = format!(
        "{}={}",
        urlencoding::encode(name),
        urlencoding::encode(value)
    );
    if let Some(max_age) = options.max_age {
        directive.push_str(&format!("; Max-Age={}", max_age));
    }
    if let Some(expires) = options.expires {
        directive.push_str(&format!(
            "; Expires={}",
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
    }
    directive.push_str(&format!(
        "; Path={}",
        options.path.as_deref().unwrap_or("/")
    ));
    if let Some(domain) = &options.domain {
        directive.push_str(&format!("; Domain={}", domain));
    }
    if options.http_only.unwrap_or(true) {
        directive.push_str("; HttpOnly");
    }
    if options.secure {
        directive.push_str("; Secure");
    }
    if let Some(same_site) = options.same_site {
        directive.push_str(&format!("; SameSite={}", same_site.as_str()));
    }
    directive
}
