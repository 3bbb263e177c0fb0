//! Session and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::future::Future;
use std::time::Instant;
use tracing::warn;

use super::ErrorResponse;
use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};
use crate::sessions::{is_valid_session_id, new_session_id, SESSION_HEADER};

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Session middleware that resolves the caller's session id.
///
/// Uses the `x-session-id` request header when present, otherwise issues a
/// new id. The id is stored in the request extensions for `SessionId` and
/// echoed back in the response header. A malformed id is rejected with 400.
pub async fn session_middleware(mut request: Request<Body>, next: Next) -> Response {
    let session_id = match request.headers().get(SESSION_HEADER) {
        Some(value) => match value.to_str() {
            Ok(id) if is_valid_session_id(id) => id.to_string(),
            _ => {
                warn!("Rejected malformed {} header", SESSION_HEADER);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!(
                            "{} must be 1-128 characters of letters, digits, '-' or '_'",
                            SESSION_HEADER
                        ),
                    }),
                )
                    .into_response();
            }
        },
        None => new_session_id(),
    };

    request
        .extensions_mut()
        .insert(SessionId(session_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }

    response
}

/// Extractor for the caller's session id.
///
/// Extracts the id stored by `session_middleware`. Falls back to a fresh id
/// if the middleware is not installed on the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let session_id = parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .unwrap_or_else(|| SessionId(new_session_id()));
        std::future::ready(Ok(session_id))
    }
}
