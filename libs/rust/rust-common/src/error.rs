//! Retryability classification shared by all services.
//!
//! Errors are classified as either transient (worth another attempt) or
//! definitive (retrying cannot change the outcome). Callers decide whether to
//! retry by asking the error, never by inspecting its message.

use std::time::Duration;

use thiserror::Error;
use tonic::{Code, Status};

/// Classification of an error as transient or definitive.
pub trait Retryable {
    /// Returns true when a later attempt may succeed.
    fn is_retryable(&self) -> bool;
}

/// Outcome of a single attempt executed under a deadline.
#[derive(Error, Debug)]
pub enum AttemptError<E> {
    /// The attempt did not finish within the per-attempt timeout
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),

    /// The attempt finished with an error
    #[error(transparent)]
    Failed(E),
}

impl<E: Retryable> Retryable for AttemptError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::TimedOut(_) => true,
            Self::Failed(err) => err.is_retryable(),
        }
    }
}

/// Returns true for gRPC codes that describe a transient condition.
///
/// # Examples
///
/// ```
/// use rust_common::error::is_transient_code;
/// use tonic::Code;
///
/// assert!(is_transient_code(Code::Unavailable));
/// assert!(!is_transient_code(Code::InvalidArgument));
/// ```
#[must_use]
pub const fn is_transient_code(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::ResourceExhausted | Code::Aborted
    )
}

impl Retryable for Status {
    fn is_retryable(&self) -> bool {
        is_transient_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        assert!(Status::unavailable("down").is_retryable());
        assert!(Status::deadline_exceeded("slow").is_retryable());
        assert!(Status::resource_exhausted("busy").is_retryable());
        assert!(Status::aborted("conflict").is_retryable());
    }

    #[test]
    fn test_definitive_status_codes() {
        assert!(!Status::invalid_argument("invalid credentials").is_retryable());
        assert!(!Status::unauthenticated("no").is_retryable());
        assert!(!Status::internal("boom").is_retryable());
        assert!(!Status::not_found("user").is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err: AttemptError<Status> = AttemptError::TimedOut(Duration::from_secs(1));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_failed_attempt_defers_to_inner_error() {
        let err: AttemptError<Status> = AttemptError::Failed(Status::internal("boom"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err: AttemptError<Status> = AttemptError::TimedOut(Duration::from_secs(2));
        assert_eq!(err.to_string(), "attempt timed out after 2s");
    }
}
