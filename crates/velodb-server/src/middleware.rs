use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID attached to every request, readable by handlers as an
/// extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags each request with an ID and echoes it back on the response.
///
/// A client-supplied `x-request-id` header wins, so IDs stay stable across
/// proxies; a request without one gets a fresh UUIDv4.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = incoming_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    // Both sources already round-trip as header values; precompute the echo
    // so the id String can move into the extension.
    let echo = HeaderValue::from_str(&id).ok();

    request.extensions_mut().insert(RequestId(id));

    let mut response = next.run(request).await;
    if let Some(value) = echo {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn incoming_id(request: &Request) -> Option<String> {
    let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    Some(raw.to_string())
}
