//! Bearer token verification for the authorization gate.

pub mod claims;
pub mod token;
pub mod verifier;

pub use claims::Claims;
pub use token::{SignatureValidated, Token, TokenState, Unvalidated, Validated};
pub use verifier::{Hs256Verifier, TokenVerifier, VerifyError};

#[cfg(test)]
pub use verifier::MockTokenVerifier;
