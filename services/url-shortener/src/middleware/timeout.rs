//! Request timeout stage.
//!
//! Answers with the standard error envelope once the budget elapses.

use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

use crate::error::ApiError;

/// Timeout layer for the HTTP pipeline
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeoutLayer {
    duration: Duration,
}

impl RequestTimeoutLayer {
    /// Creates a new timeout layer with the given duration
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for RequestTimeoutLayer {
    type Service = RequestTimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTimeoutService {
            inner,
            duration: self.duration,
        }
    }
}

/// Timeout service wrapper
#[derive(Debug, Clone)]
pub struct RequestTimeoutService<S> {
    inner: S,
    duration: Duration,
}

impl<S, B> Service<Request<B>> for RequestTimeoutService<S>
where
    S: Service<Request<B>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let duration = self.duration;
        // Swap in the clone so the readied service handles this request
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match timeout(duration, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?duration, "request timed out");
                    Ok(ApiError::Timeout { duration }.into_response())
                }
            }
        })
    }
}
