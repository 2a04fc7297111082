use super::request_id::X_REQUEST_ID;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Emits one `metrics` event per request with status and latency.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let content_length = req
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    // Set by the request id layer, which wraps this one
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        warn!(
            target: "metrics",
            method = %method,
            path = %path,
            status = %status.as_u16(),
            request_bytes = content_length,
            latency_ms = %latency.as_millis(),
            request_id = %request_id,
            "request_failed"
        );
    } else {
        info!(
            target: "metrics",
            method = %method,
            path = %path,
            status = %status.as_u16(),
            request_bytes = content_length,
            latency_ms = %latency.as_millis(),
            request_id = %request_id,
            "request_completed"
        );
    }

    response
}
