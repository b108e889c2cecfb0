//! Access logging for every HTTP request.
//!
//! Each request produces one `request completed` event carrying method, raw
//! path, route template, status code and latency. Requests that did not match
//! a route fall back to the raw path with UUID segments replaced by `{id}`.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Middleware that logs one line per completed request
pub async fn request_logging_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| normalize_path(&path));

    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            endpoint = %endpoint,
            status,
            latency_ms,
            "request completed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            endpoint = %endpoint,
            status,
            latency_ms,
            "request completed"
        );
    }

    response
}

/// Replace UUID path segments with `{id}`.
///
/// - `/api/v1/subscriptions/60601fee-2bf1-4721-ae6f-7636e79a0cba` -> `/api/v1/subscriptions/{id}`
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| if is_uuid(segment) { "{id}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// Check if a string looks like a UUID (8-4-4-4-12 hex pattern)
fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    let expected_lens = [8, 4, 4, 4, 12];
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == expected_lens.len()
        && parts
            .iter()
            .zip(expected_lens.iter())
            .all(|(part, &len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
}
