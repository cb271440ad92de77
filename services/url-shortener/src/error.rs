//! Caller-facing error handling.
//!
//! Every failure leaving a handler or gate goes through [`ApiError`]. The body
//! always carries one of a small, fixed set of messages; causes stay in logs.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::credential::CredentialError;

/// Request-level failure, classified once at the handler boundary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body or path could not be decoded, or failed validation
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// `Authorization` header unusable
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Rejected by a gate
    #[error("unauthorized")]
    Unauthorized,

    /// Identity service rejected the forwarded credential
    #[error("invalid credential")]
    InvalidCredential,

    /// Alias has no record
    #[error("alias not found")]
    NotFound,

    /// Request exceeded its time budget
    #[error("request timed out after {duration:?}")]
    Timeout {
        /// Budget that elapsed
        duration: Duration,
    },

    /// Identity service failure other than a credential rejection
    #[error("delegate failure: {0}")]
    Delegate(anyhow::Error),

    /// Storage failure or any other unexpected condition
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Stable error codes used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Undecodable or invalid input
    BadRequest,
    /// `Authorization` header unusable
    CredentialInvalid,
    /// Rejected by a gate
    Unauthorized,
    /// Identity service rejected the credential
    InvalidCredential,
    /// Unknown alias
    NotFound,
    /// Request budget elapsed
    Timeout,
    /// Identity service failure
    Delegate,
    /// Anything unexpected
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::CredentialInvalid => "AUTH_CREDENTIAL_INVALID",
            Self::Unauthorized => "AUTH_UNAUTHORIZED",
            Self::InvalidCredential => "AUTH_REJECTED_BY_IDENTITY",
            Self::NotFound => "ALIAS_NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::Delegate => "DELEGATE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status for this error
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::CredentialInvalid | Self::Unauthorized | Self::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Delegate => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Error code for this failure.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::Credential(_) => ErrorCode::CredentialInvalid,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::InvalidCredential => ErrorCode::InvalidCredential,
            Self::NotFound => ErrorCode::NotFound,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Delegate(_) => ErrorCode::Delegate,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Message returned to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => (*msg).to_string(),
            Self::Credential(err) => err.to_string(),
            Self::Unauthorized => "unauthorized".to_string(),
            Self::InvalidCredential => "Invalid credential".to_string(),
            Self::NotFound => "wrong alias".to_string(),
            Self::Timeout { .. } => "request timeout".to_string(),
            Self::Delegate(_) => "error".to_string(),
            // Never expose internal error details
            Self::Internal(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code().http_status();
        (status, Json(StandardResponse::error(self.public_message()))).into_response()
    }
}

/// Outcome flag of every JSON response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Request succeeded
    #[serde(rename = "OK")]
    Ok,
    /// Request failed; `error` carries the message
    #[serde(rename = "Error")]
    Error,
}

/// Common response envelope: `{"status":"OK"}` or
/// `{"status":"Error","error":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardResponse {
    /// Outcome flag
    pub status: Status,
    /// Caller-facing message, only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StandardResponse {
    /// Success envelope.
    pub const fn ok() -> Self {
        Self {
            status: Status::Ok,
            error: None,
        }
    }

    /// Failure envelope carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: Some(message.into()),
        }
    }
}
