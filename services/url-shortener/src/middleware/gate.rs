//! Authorization gate for alias-mutating routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::credential::Credential;
use crate::error::ApiError;
use crate::jwt::TokenVerifier;

/// State of [`authorization_gate`].
#[derive(Clone)]
pub struct GateState {
    /// Verifier applied to every bearer token
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Verifies the bearer token before the request reaches a handler.
///
/// On success the verified [`crate::jwt::Claims`] are inserted as a request
/// extension. On failure the request is answered with 401 and the inner
/// service is never called.
pub async fn authorization_gate(
    State(state): State<GateState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = Credential::from_headers(req.headers()).map_err(|e| {
        info!(reason = %e, path = %req.uri().path(), "gate rejected request");
        ApiError::Unauthorized
    })?;

    let claims = state.verifier.verify(&credential).map_err(|e| {
        info!(reason = %e, path = %req.uri().path(), "gate rejected token");
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
