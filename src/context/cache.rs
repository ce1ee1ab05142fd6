//! Per-request cache policy.
//!
//! # Responsibilities
//! - Track the cache policy set by middleware and handlers
//! - Accumulate de-duplicated invalidation tags
//! - Render the final Cache-Control header value
//!
//! # Design Decisions
//! - Last write wins for policy fields; tags only ever accumulate
//! - `max-age=0` is meaningful and emitted; absent fields are omitted
//! - Visibility defaults to public

use serde::{Deserialize, Serialize};

/// Cache policy for a single response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Freshness lifetime in seconds.
    pub max_age: Option<u64>,

    /// stale-while-revalidate window in seconds.
    pub stale_while_revalidate: Option<u64>,

    /// Restrict caching to the end client.
    pub private: bool,

    /// Invalidation tags to union into the accumulated tag set.
    /// Omitting this leaves already-accumulated tags untouched.
    pub tags: Option<Vec<String>>,
}

/// The last-set policy plus the accumulated tag set.
#[derive(Debug, Default)]
pub(crate) struct CacheState {
    options: Option<CacheOptions>,
    tags: Vec<String>,
}

impl CacheState {
    /// Replace the current policy. Tags carried on `options` are unioned
    /// into the accumulated set rather than replacing it.
    pub fn set(&mut self, options: CacheOptions) {
        if let Some(tags) = &options.tags {
            self.add_tags(tags);
        }
        self.options = Some(CacheOptions {
            tags: None,
            ..options
        });
    }

    /// Union tags into the accumulated set without touching other fields.
    pub fn add_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        for tag in tags {
            let tag = tag.as_ref();
            if !self.tags.iter().any(|have| have == tag) {
                self.tags.push(tag.to_string());
            }
        }
    }

    pub fn get(&self) -> Option<&CacheOptions> {
        self.options.as_ref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Render the Cache-Control value, or `None` if no policy was ever set.
    pub fn header_value(&self) -> Option<String> {
        let options = self.options.as_ref()?;
        let mut fields = Vec::with_capacity(3);
        fields.push(if options.private {
            "private".to_string()
        } else {
            "public".to_string()
        });
        if let Some(max_age) = options.max_age {
            fields.push(format!("max-age={}", max_age));
        }
        if let Some(swr) = options.stale_while_revalidate {
            fields.push(format!("stale-while-revalidate={}", swr));
        }
        Some(fields.join(", "))
    }
}
