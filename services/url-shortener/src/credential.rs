//! Bearer credential extraction.
//!
//! A [`Credential`] can only be obtained from a header map holding exactly one
//! well-formed `Authorization: Bearer <token>` value. The token is stored
//! without the scheme prefix; [`Credential::header_value`] re-attaches it for
//! forwarding, so every outgoing call carries the same `Bearer <token>` form.

use std::fmt;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use thiserror::Error;

/// Authorization scheme marker, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Reasons an `Authorization` header cannot yield a credential.
///
/// The display text is safe to return to callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// No `Authorization` header present
    #[error("missing Authorization header")]
    MissingHeader,

    /// More than one `Authorization` header present
    #[error("more than one Authorization header")]
    AmbiguousHeader,

    /// Value does not start with `Bearer `
    #[error("missing \"Bearer \" prefix in Authorization header")]
    MalformedScheme,

    /// Nothing follows the `Bearer ` prefix
    #[error("missing token in Authorization header")]
    EmptyToken,
}

/// Bearer token presented by the caller of the current request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Extracts the bearer credential from request headers.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] unless exactly one `Authorization` value
    /// of the form `Bearer <token>` with a non-empty token is present.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, CredentialError> {
        let mut values = headers.get_all(AUTHORIZATION).iter();

        let value = values.next().ok_or(CredentialError::MissingHeader)?;
        if values.next().is_some() {
            return Err(CredentialError::AmbiguousHeader);
        }

        let value = value.to_str().map_err(|_| CredentialError::MalformedScheme)?;
        Self::parse(value)
    }

    /// Parses a single `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::MalformedScheme`] or
    /// [`CredentialError::EmptyToken`] for malformed values.
    pub fn parse(value: &str) -> Result<Self, CredentialError> {
        let token = value
            .strip_prefix(BEARER_PREFIX)
            .ok_or(CredentialError::MalformedScheme)?;

        if token.is_empty() {
            return Err(CredentialError::EmptyToken);
        }

        Ok(Self {
            token: token.to_string(),
        })
    }

    /// Raw token without the scheme prefix.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value to forward as `authorization` metadata: `Bearer <token>`.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}
