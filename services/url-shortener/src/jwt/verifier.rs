//! Bearer token verification.
//!
//! Tokens are issued by the identity service and signed with HS256 using the
//! secret both services share.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::claims::Claims;
use super::token::{Token, Unvalidated};
use crate::credential::Credential;

/// Token verification failures. Never returned to callers verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Token structure is malformed
    #[error("token malformed: {reason}")]
    Malformed {
        /// Description of the malformation
        reason: String,
    },

    /// Signature does not match the shared secret
    #[error("token signature invalid")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },

    /// A required claim is empty
    #[error("required claim missing: {0}")]
    MissingClaim(&'static str),
}

/// Verifies a presented credential and yields its claims.
#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    /// Checks signature and expiry, returning the token's claims.
    ///
    /// # Errors
    ///
    /// [`VerifyError`] describing why the token is unusable.
    fn verify(&self, credential: &Credential) -> Result<Claims, VerifyError>;
}

/// HS256 verifier keyed by the secret shared with the identity service.
pub struct Hs256Verifier {
    key: DecodingKey,
}

impl Hs256Verifier {
    /// Creates a verifier keyed by `secret`.
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        }
    }
}

impl TokenVerifier for Hs256Verifier {
    fn verify(&self, credential: &Credential) -> Result<Claims, VerifyError> {
        let validated = Token::<Unvalidated>::parse(credential.token())?
            .validate_signature(&self.key, Algorithm::HS256)?
            .validate_claims()?;

        validated.into_claims().ok_or_else(|| VerifyError::Malformed {
            reason: "claims not available".to_string(),
        })
    }
}
