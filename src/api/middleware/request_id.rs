use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Tags every exchange with an `x-request-id`, reusing the caller's when it
/// is a valid header value.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(fresh_request_id);

    req.headers_mut()
        .insert(X_REQUEST_ID.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(X_REQUEST_ID.clone(), request_id);

    response
}

fn fresh_request_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value
    HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap_or(HeaderValue::from_static("unknown"))
}
