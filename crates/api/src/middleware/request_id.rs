//! Request ID middleware for request tracing and correlation.
//!
//! Every response carries an `x-request-id` the client can quote in support
//! tickets; the same ID tags the tracing span and the Sentry scope, so a
//! reported failure can be matched to its server-side event.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream-supplied ID we will echo back.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Take an upstream request ID if it is safe to echo, minting one otherwise.
///
/// Proxies are trusted to hand us an ID, but not blindly: anything overlong
/// or containing non-graphic characters is replaced with a fresh UUID rather
/// than reflected into the response headers and logs.
fn resolve_request_id(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a unique request ID.
///
/// The resolved ID is recorded in the current tracing span, set as a Sentry
/// tag for error correlation, and added to the response headers.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(&request);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_id(id: &str) -> Request {
        Request::builder()
            .header(REQUEST_ID_HEADER, id)
            .body(Body::empty())
            .expect("valid request")
    }

    #[test]
    fn test_upstream_id_is_kept() {
        let request = request_with_id("lb-7f3a2b");
        assert_eq!(resolve_request_id(&request), "lb-7f3a2b");
    }

    #[test]
    fn test_missing_id_is_minted() {
        let request = Request::builder().body(Body::empty()).expect("valid request");
        let id = resolve_request_id(&request);
        assert!(id.parse::<Uuid>().is_ok());
    }

    #[test]
    fn test_overlong_id_is_replaced() {
        let request = request_with_id(&"a".repeat(MAX_REQUEST_ID_LEN + 1));
        let id = resolve_request_id(&request);
        assert!(id.parse::<Uuid>().is_ok());
    }

    #[test]
    fn test_unprintable_id_is_replaced() {
        let request = request_with_id("bad\tid");
        let id = resolve_request_id(&request);
        assert!(id.parse::<Uuid>().is_ok());
    }
}
