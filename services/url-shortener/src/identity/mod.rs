//! Admin privilege delegation to the identity service.
//!
//! Handlers depend on [`PrivilegeDelegate`] only. Every call receives a
//! [`CallContext`] holding the credential of the request being served; the
//! delegate forwards it as outgoing metadata and keeps nothing afterwards.

pub mod client;
pub mod proto;

use async_trait::async_trait;
use rust_common::AttemptError;
use thiserror::Error;
use tonic::{Code, Status};

use crate::credential::Credential;

pub use client::{GrpcPrivilegeDelegate, IdentityClientConfig};

/// Per-call context forwarded to the identity service.
#[derive(Debug, Clone)]
pub struct CallContext {
    credential: Credential,
    request_id: String,
}

impl CallContext {
    /// Binds a credential to the request it was presented with.
    #[must_use]
    pub fn new(credential: Credential, request_id: impl Into<String>) -> Self {
        Self {
            credential,
            request_id: request_id.into(),
        }
    }

    /// Credential to forward.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Identifier of the inbound request.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Classified failure of a delegated admin mutation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DelegateError {
    /// The identity service rejected the forwarded credential or arguments
    #[error("identity service rejected the credential: {0}")]
    InvalidCredential(String),

    /// Transient failure: transport, overload or deadline
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    /// Any other RPC failure
    #[error("identity service call failed with {code:?}: {message}")]
    Rpc {
        /// gRPC status code
        code: Code,
        /// Status message from the remote side
        message: String,
    },
}

impl DelegateError {
    /// Classifies a gRPC status by its code.
    #[must_use]
    pub fn from_status(status: &Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::InvalidArgument | Code::Unauthenticated => Self::InvalidCredential(message),
            code if rust_common::error::is_transient_code(code) => Self::Unavailable(message),
            code => Self::Rpc { code, message },
        }
    }

    /// Short name for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredential(_) => "invalid_credential",
            Self::Unavailable(_) => "unavailable",
            Self::Rpc { .. } => "rpc",
        }
    }
}

impl From<Status> for DelegateError {
    fn from(status: Status) -> Self {
        Self::from_status(&status)
    }
}

impl From<AttemptError<Status>> for DelegateError {
    fn from(err: AttemptError<Status>) -> Self {
        match err {
            AttemptError::TimedOut(elapsed) => {
                Self::Unavailable(format!("attempt timed out after {elapsed:?}"))
            }
            AttemptError::Failed(status) => Self::from_status(&status),
        }
    }
}

/// Grants and revokes admin status on behalf of the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrivilegeDelegate: Send + Sync {
    /// Grants admin status to `identity` within `app_id`.
    async fn grant_admin(
        &self,
        ctx: &CallContext,
        identity: &str,
        app_id: i32,
    ) -> Result<bool, DelegateError>;

    /// Revokes admin status from `identity` within `app_id`.
    async fn revoke_admin(
        &self,
        ctx: &CallContext,
        identity: &str,
        app_id: i32,
    ) -> Result<bool, DelegateError>;
}
