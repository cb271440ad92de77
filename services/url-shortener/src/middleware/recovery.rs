//! Panic containment.

use std::any::Any;

use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::ApiError;

/// Converts a panic caught by `CatchPanicLayer` into a 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    error!(panic = %detail, "handler panicked");
    ApiError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
