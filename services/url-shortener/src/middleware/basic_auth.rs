//! Operator gate for the admin routes.
//!
//! Operators authenticate with HTTP basic credentials carried in
//! `X-Operator-Authorization`, leaving `Authorization` to the bearer token
//! that is forwarded to the identity service.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::info;

use crate::error::ApiError;

/// Header carrying operator basic credentials.
pub const OPERATOR_AUTH_HEADER: &str = "x-operator-authorization";

const REALM: &str = "Basic realm=\"url_shortener\"";

/// Expected operator credentials.
#[derive(Debug)]
pub struct OperatorCredentials {
    user: String,
    password: SecretString,
}

impl OperatorCredentials {
    /// Credentials an operator must present.
    pub fn new(user: impl Into<String>, password: SecretString) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }

    /// Constant-time check of a `user:password` pair.
    pub fn matches(&self, user: &str, password: &str) -> bool {
        let user_ok = self.user.as_bytes().ct_eq(user.as_bytes());
        let password_ok = self
            .password
            .expose_secret()
            .as_bytes()
            .ct_eq(password.as_bytes());
        bool::from(user_ok & password_ok)
    }
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(OPERATOR_AUTH_HEADER)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Rejects requests without valid operator credentials.
pub async fn operator_gate(
    State(expected): State<Arc<OperatorCredentials>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = basic_credentials(req.headers())
        .is_some_and(|(user, password)| expected.matches(&user, &password));

    if !authorized {
        info!(path = %req.uri().path(), "operator gate rejected request");
        let mut response = ApiError::Unauthorized.into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
        return response;
    }

    next.run(req).await
}
