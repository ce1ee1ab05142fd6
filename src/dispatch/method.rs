//! Effective-method computation.
//!
//! HTML forms can only submit GET and POST; a hidden `_method` field
//! lets a form-encoded POST dispatch as PUT, PATCH, or DELETE.
//!
//! # Design Decisions
//! - Only form-encoded bodies (urlencoded or multipart) are inspected
//! - Streaming or oversized bodies are never buffered; they pass
//!   through untouched
//! - Any failure reading or parsing the body falls back silently to POST
//! - The request handed downstream keeps its original method and a
//!   re-buffered body

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, Method, Request};

/// Field name carrying the override.
const OVERRIDE_FIELD: &str = "_method";

/// Bodies larger than this are not inspected for an override.
const MAX_OVERRIDE_BODY: usize = 1024 * 1024;

/// Compute the method used for route matching and handler selection.
/// Returns the effective method and the request to hand downstream.
pub(crate) async fn effective_method(request: Request<Body>) -> (Method, Request<Body>) {
    if request.method() != Method::POST {
        let method = request.method().clone();
        return (method, request);
    }

    // The boundary parameter is case-sensitive; only the media type is
    // compared case-insensitively.
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    let media_type = content_type.to_ascii_lowercase();
    let is_urlencoded = media_type.starts_with("application/x-www-form-urlencoded");
    let is_multipart = media_type.starts_with("multipart/form-data");
    if !is_urlencoded && !is_multipart {
        return (Method::POST, request);
    }

    let (parts, body) = request.into_parts();

    // Only bodies with a known size under the cap are inspected.
    // Streaming or oversized bodies pass through untouched.
    match body.size_hint().exact() {
        Some(size) if size <= MAX_OVERRIDE_BODY as u64 => {}
        _ => return (Method::POST, Request::from_parts(parts, body)),
    }

    let bytes = match axum::body::to_bytes(body, MAX_OVERRIDE_BODY).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(error = %error, "failed to buffer form body for method override");
            return (Method::POST, Request::from_parts(parts, Body::empty()));
        }
    };

    let field = if is_urlencoded {
        urlencoded_field(&bytes, OVERRIDE_FIELD)
    } else {
        multipart_field(&bytes, &content_type, OVERRIDE_FIELD)
    };

    let method = match field.map(|value| value.trim().to_ascii_uppercase()) {
        Some(value) if value == "PUT" => Method::PUT,
        Some(value) if value == "PATCH" => Method::PATCH,
        Some(value) if value == "DELETE" => Method::DELETE,
        _ => Method::POST,
    };

    // Downstream consumers see the original POST with its body intact.
    (method, Request::from_parts(parts, Body::from(bytes)))
}

fn urlencoded_field(bytes: &Bytes, field: &str) -> Option<String> {
    url::form_urlencoded::parse(bytes)
        .find(|(name, _)| name == field)
        .map(|(_, value)| value.into_owned())
}

/// Minimal multipart scan: enough to pull one text field out of a
/// well-formed body without a full multipart parser.
fn multipart_field(bytes: &Bytes, content_type: &str, field: &str) -> Option<String> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|attr| attr.strip_prefix("boundary="))?
        .trim_matches('"');
    let body = std::str::from_utf8(bytes).ok()?;
    let marker = format!("name=\"{}\"", field);

    for part in body.split(&format!("--{}", boundary)) {
        let Some((headers, value)) = part.split_once("\r\n\r\n") else {
            continue;
        };
        if headers.contains(&marker) {
            return Some(value.trim_end_matches("\r\n").to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(content_type: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/items")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn non_post_is_untouched() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/items")
            .body(Body::empty())
            .unwrap();
        let (method, _) = effective_method(request).await;
        assert_eq!(method, Method::PUT);
    }

    #[tokio::test]
    async fn urlencoded_override_is_honored() {
        let request = post("application/x-www-form-urlencoded", "name=x&_method=delete");
        let (method, request) = effective_method(request).await;
        assert_eq!(method, Method::DELETE);
        // Original method survives for downstream consumers.
        assert_eq!(request.method(), Method::POST);
    }

    #[tokio::test]
    async fn body_remains_readable_downstream() {
        let request = post("application/x-www-form-urlencoded", "_method=PATCH&name=x");
        let (method, request) = effective_method(request).await;
        assert_eq!(method, Method::PATCH);
        let bytes = axum::body::to_bytes(request.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"_method=PATCH&name=x");
    }

    #[tokio::test]
    async fn unknown_override_value_stays_post() {
        let request = post("application/x-www-form-urlencoded", "_method=TRACE");
        let (method, _) = effective_method(request).await;
        assert_eq!(method, Method::POST);
    }

    #[tokio::test]
    async fn non_form_post_is_not_inspected() {
        let request = post("application/json", "{\"_method\":\"DELETE\"}");
        let (method, _) = effective_method(request).await;
        assert_eq!(method, Method::POST);
    }

    #[tokio::test]
    async fn multipart_override_is_honored() {
        let body = "--XBOUND\r\n\
                    Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                    hello\r\n\
                    --XBOUND\r\n\
                    Content-Disposition: form-data; name=\"_method\"\r\n\r\n\
                    put\r\n\
                    --XBOUND--\r\n";
        let request = post("multipart/form-data; boundary=XBOUND", body);
        let (method, _) = effective_method(request).await;
        assert_eq!(method, Method::PUT);
    }

    #[tokio::test]
    async fn multipart_boundary_case_is_preserved() {
        // Browser boundaries are mixed-case; the match must not fold them.
        let body = "------WebKitFormBoundaryAbC\r\n\
                    Content-Disposition: form-data; name=\"_method\"\r\n\r\n\
                    delete\r\n\
                    ------WebKitFormBoundaryAbC--\r\n";
        let request = post(
            "multipart/form-data; boundary=----WebKitFormBoundaryAbC",
            body,
        );
        let (method, _) = effective_method(request).await;
        assert_eq!(method, Method::DELETE);
    }

    #[tokio::test]
    async fn oversized_form_body_passes_through_untouched() {
        let body = format!("name={}&_method=DELETE", "x".repeat(MAX_OVERRIDE_BODY));
        let len = body.len();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/items")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        let (method, request) = effective_method(request).await;
        // Too large to inspect: no override, but the body survives intact.
        assert_eq!(method, Method::POST);
        let bytes = axum::body::to_bytes(request.into_body(), 2 * MAX_OVERRIDE_BODY)
            .await
            .unwrap();
        assert_eq!(bytes.len(), len);
    }

    #[tokio::test]
    async fn malformed_multipart_falls_back_to_post() {
        let request = post("multipart/form-data; boundary=XBOUND", "not multipart at all");
        let (method, _) = effective_method(request).await;
        assert_eq!(method, Method::POST);
    }
}
