//! Shared library for cross-cutting concerns in url-platform Rust services.
//!
//! This crate provides centralized implementations for:
//! - Retryability classification for service and transport errors
//! - Retry policies with bounded attempts, per-attempt timeouts and
//!   exponential backoff
//! - Tracing subscriber initialization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod retry;
pub mod tracing_config;

pub use error::{AttemptError, Retryable};
pub use retry::{RetryConfig, RetryPolicy};
pub use tracing_config::{init_tracing, TracingConfig};
