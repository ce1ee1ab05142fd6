//! Shared helpers for integration tests.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use serde_json::Value;
use strata::{Route, RouteMatch, RouteMatcher};

/// Matches ":param"-style patterns segment by segment. Stands in for
/// the external router collaborator.
pub struct PatternMatcher {
    routes: Vec<Route>,
}

impl PatternMatcher {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }
}

impl RouteMatcher for PatternMatcher {
    fn match_path(&self, pathname: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            match_pattern(&route.pattern, pathname).map(|params| RouteMatch {
                route: route.clone(),
                params,
                pathname: pathname.to_string(),
            })
        })
    }
}

fn match_pattern(pattern: &str, pathname: &str) -> Option<HashMap<String, String>> {
    let pattern_segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = pathname.trim_matches('/').split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }
    let mut params = HashMap::new();
    for (pattern_segment, path_segment) in pattern_segments.iter().zip(&path_segments) {
        if let Some(name) = pattern_segment.strip_prefix(':') {
            params.insert(name.to_string(), path_segment.to_string());
        } else if pattern_segment != path_segment {
            return None;
        }
    }
    Some(params)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn get_json(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("accept", "application/json")
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn form_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
