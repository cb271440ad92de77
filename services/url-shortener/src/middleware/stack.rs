//! Shared pipeline stages.
//!
//! Stage order (outermost to innermost):
//! 1. SetRequestId - tags the request with `x-request-id`
//! 2. Trace - one span per request, carrying the request id
//! 3. PropagateRequestId - echoes the id on the response
//! 4. CatchPanic - turns handler panics into a 500 envelope
//! 5. RequestTimeout - bounds handler time
//!
//! Route-group gates are added by the router, inside these stages.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info_span, Level, Span};

use super::format::UrlFormat;
use super::recovery::panic_response;
use super::timeout::RequestTimeoutLayer;
use crate::context::REQUEST_ID_HEADER;

fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let format = req
        .extensions()
        .get::<UrlFormat>()
        .map_or("none", |f| f.as_str());

    info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
        format,
    )
}

/// Wraps a route group in the shared stages.
pub fn with_common_stages<S>(router: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(request_span)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(RequestTimeoutLayer::new(request_timeout)),
    )
}
