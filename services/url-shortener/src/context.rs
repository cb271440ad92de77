//! Per-request context.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::{info_span, Span};
use uuid::Uuid;

/// Header carrying the request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request identity shared by every log record of one request.
///
/// Immutable once extracted; [`RequestContext::span`] derives a fresh span per
/// operation instead of mutating a shared logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
}

impl RequestContext {
    /// Context for a known request id.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Reads `x-request-id`, generating a UUID v4 when absent or unreadable.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        Self { request_id }
    }

    /// Identifier of the request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Span for one handler operation.
    pub fn span(&self, op: &'static str) -> Span {
        info_span!("handler", op, request_id = %self.request_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<Self>() {
            return Ok(ctx.clone());
        }
        Ok(Self::from_headers(&parts.headers))
    }
}
