//! Request handlers.
//!
//! Every handler runs the same four steps: decode the input, validate it,
//! call one capability, then classify the outcome into exactly one response.
//! Known outcomes are logged at info, unexpected ones at error with the cause.

pub mod admin;
pub mod alias;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use tracing::{error, info};

use crate::directory::DirectoryError;
use crate::error::ApiError;
use crate::identity::DelegateError;

const DECODE_FAILED: &str = "failed to decode request";

/// Decode step for JSON bodies.
fn decode<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        let err = ApiError::BadRequest(DECODE_FAILED);
        info!(
            code = err.code().as_str(),
            reason = %rejection.body_text(),
            "failed to decode request body"
        );
        err
    })
}

/// Classifies a directory failure.
fn directory_failure(err: DirectoryError, alias: &str) -> ApiError {
    match err {
        DirectoryError::NotFound => {
            let classified = ApiError::NotFound;
            info!(code = classified.code().as_str(), alias = %alias, "alias not found");
            classified
        }
        other => {
            let cause = other.to_string();
            let classified = ApiError::Internal(other.into());
            error!(
                code = classified.code().as_str(),
                error = %cause,
                "directory operation failed"
            );
            classified
        }
    }
}

/// Classifies a delegate failure.
fn delegate_failure(err: DelegateError) -> ApiError {
    match err {
        DelegateError::InvalidCredential(reason) => {
            let classified = ApiError::InvalidCredential;
            info!(
                code = classified.code().as_str(),
                reason = %reason,
                "identity service rejected credential"
            );
            classified
        }
        other => {
            let cause = other.to_string();
            let kind = other.kind();
            let classified = ApiError::Delegate(other.into());
            error!(
                code = classified.code().as_str(),
                kind,
                error = %cause,
                "identity service call failed"
            );
            classified
        }
    }
}
