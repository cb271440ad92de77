//! Admin privilege endpoints, delegated to the identity service.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::{info, Instrument};

use super::{decode, delegate_failure};
use crate::app::AppState;
use crate::context::RequestContext;
use crate::credential::Credential;
use crate::error::{ApiError, StandardResponse};
use crate::identity::CallContext;

/// Body of `POST /user` and `DELETE /user`.
#[derive(Debug, Deserialize)]
pub struct AdminMutationRequest {
    /// Identity whose admin status changes
    #[serde(default)]
    pub email: String,
    /// Application scope of the change
    pub app_id: Option<i32>,
}

impl AdminMutationRequest {
    fn validate(&self) -> Result<i32, ApiError> {
        if self.email.is_empty() {
            return Err(ApiError::BadRequest("email is required"));
        }
        self.app_id
            .ok_or(ApiError::BadRequest("app_id is required"))
    }
}

/// Mutation performed on the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Grant,
    Revoke,
}

async fn mutate(
    state: AppState,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Json<AdminMutationRequest>, JsonRejection>,
    mutation: Mutation,
) -> Result<Json<StandardResponse>, ApiError> {
    let request = decode(body)?;
    let app_id = request.validate()?;

    let credential = Credential::from_headers(&headers).map_err(|e| {
        info!(reason = %e, "admin request without usable credential");
        ApiError::from(e)
    })?;
    let call = CallContext::new(credential, ctx.request_id());

    let outcome = match mutation {
        Mutation::Grant => {
            state
                .delegate
                .grant_admin(&call, &request.email, app_id)
                .await
        }
        Mutation::Revoke => {
            state
                .delegate
                .revoke_admin(&call, &request.email, app_id)
                .await
        }
    };

    let changed = outcome.map_err(delegate_failure)?;
    info!(email = %request.email, app_id, changed, ?mutation, "admin mutation completed");
    Ok(Json(StandardResponse::ok()))
}

/// `POST /user`
pub async fn grant_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Json<AdminMutationRequest>, JsonRejection>,
) -> Result<Json<StandardResponse>, ApiError> {
    let span = ctx.span("admin.grant");
    mutate(state, ctx, headers, body, Mutation::Grant)
        .instrument(span)
        .await
}

/// `DELETE /user`
pub async fn revoke_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Result<Json<AdminMutationRequest>, JsonRejection>,
) -> Result<Json<StandardResponse>, ApiError> {
    let span = ctx.span("admin.revoke");
    mutate(state, ctx, headers, body, Mutation::Revoke)
        .instrument(span)
        .await
}
