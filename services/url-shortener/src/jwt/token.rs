//! Type-state JWT token.
//!
//! Claims are reachable only on a `Token<Validated>`, which can only be
//! produced by checking the signature and then the expiry.

use std::marker::PhantomData;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};

use super::claims::Claims;
use super::verifier::VerifyError;

mod private {
    pub trait Sealed {}
}

/// Marker trait for token validation states
pub trait TokenState: private::Sealed {}

/// Parsed header only
#[derive(Debug)]
pub struct Unvalidated;
impl private::Sealed for Unvalidated {}
impl TokenState for Unvalidated {}

/// Signature verified, claims decoded but not yet checked
#[derive(Debug)]
pub struct SignatureValidated;
impl private::Sealed for SignatureValidated {}
impl TokenState for SignatureValidated {}

/// Signature and claims verified
#[derive(Debug)]
pub struct Validated;
impl private::Sealed for Validated {}
impl TokenState for Validated {}

/// JWT in a given validation state.
#[derive(Debug)]
pub struct Token<State: TokenState> {
    raw: String,
    header: Header,
    claims: Option<Claims>,
    _state: PhantomData<State>,
}

impl Token<Unvalidated> {
    /// Parses the header of a raw JWT.
    ///
    /// # Errors
    ///
    /// [`VerifyError::Malformed`] if the header cannot be decoded.
    pub fn parse(raw: &str) -> Result<Self, VerifyError> {
        let header = decode_header(raw).map_err(|e| VerifyError::Malformed {
            reason: format!("invalid header: {e}"),
        })?;

        Ok(Token {
            raw: raw.to_string(),
            header,
            claims: None,
            _state: PhantomData,
        })
    }

    /// Verifies the signature with `key` using `algorithm`.
    ///
    /// Tokens whose header names a different algorithm are rejected.
    pub fn validate_signature(
        self,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<Token<SignatureValidated>, VerifyError> {
        if self.header.alg != algorithm {
            return Err(VerifyError::Malformed {
                reason: format!("unexpected algorithm {:?}", self.header.alg),
            });
        }

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(&self.raw, key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
                _ => VerifyError::Malformed {
                    reason: format!("signature validation failed: {e}"),
                },
            }
        })?;

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: Some(token_data.claims),
            _state: PhantomData,
        })
    }
}

impl Token<SignatureValidated> {
    /// Checks expiry and transitions to the validated state.
    pub fn validate_claims(self) -> Result<Token<Validated>, VerifyError> {
        let claims = self.claims.as_ref().ok_or_else(|| VerifyError::Malformed {
            reason: "claims not available".to_string(),
        })?;

        if claims.is_expired() {
            return Err(VerifyError::Expired {
                expired_at: chrono::DateTime::from_timestamp(claims.exp, 0)
                    .unwrap_or_else(chrono::Utc::now),
            });
        }
        if claims.email.is_empty() {
            return Err(VerifyError::MissingClaim("email"));
        }

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: self.claims,
            _state: PhantomData,
        })
    }
}

impl Token<Validated> {
    /// Consumes the token, returning its claims.
    pub fn into_claims(self) -> Option<Claims> {
        self.claims
    }
}
