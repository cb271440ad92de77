//! Alias endpoints: create, delete, redirect.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};
use url::Url;

use super::{decode, directory_failure};
use crate::app::AppState;
use crate::context::RequestContext;
use crate::error::{ApiError, StandardResponse};

/// Body of `POST /url`.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    /// Absolute `http` or `https` URL to shorten
    #[serde(default)]
    pub url: String,
}

impl SaveRequest {
    /// Returns the parsed URL. Its serialization is what gets stored, so
    /// control characters the parser strips never reach the directory.
    fn validate(&self) -> Result<Url, ApiError> {
        if self.url.is_empty() {
            return Err(ApiError::BadRequest("url is required"));
        }
        match Url::parse(&self.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
            _ => Err(ApiError::BadRequest("invalid url")),
        }
    }
}

/// Body returned by `POST /url`.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Status envelope
    #[serde(flatten)]
    pub response: StandardResponse,
    /// Alias generated for the saved URL
    pub alias: String,
}

fn validate_alias(alias: &str) -> Result<(), ApiError> {
    if alias.is_empty() {
        return Err(ApiError::BadRequest("alias is empty"));
    }
    Ok(())
}

/// `POST /url`
pub async fn save_url(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    async move {
        let request = decode(body)?;
        let url = request.validate()?;

        let alias = state
            .directory
            .save(url.as_str())
            .await
            .map_err(|e| directory_failure(e, ""))?;

        info!(alias = %alias, "url saved");
        Ok(Json(SaveResponse {
            response: StandardResponse::ok(),
            alias,
        }))
    }
    .instrument(ctx.span("url.save"))
    .await
}

/// `DELETE /url/{alias}`
pub async fn delete_url(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(alias): Path<String>,
) -> Result<Json<StandardResponse>, ApiError> {
    async move {
        validate_alias(&alias)?;

        state
            .directory
            .delete(&alias)
            .await
            .map_err(|e| directory_failure(e, &alias))?;

        info!(alias = %alias, "alias deleted");
        Ok(Json(StandardResponse::ok()))
    }
    .instrument(ctx.span("url.delete"))
    .await
}

/// `GET /{alias}`
pub async fn redirect(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(alias): Path<String>,
) -> Result<Response, ApiError> {
    async move {
        validate_alias(&alias)?;

        let target = state
            .directory
            .resolve(&alias)
            .await
            .map_err(|e| directory_failure(e, &alias))?;

        let location = HeaderValue::try_from(target.as_str()).map_err(|e| {
            let err = ApiError::Internal(anyhow::anyhow!("stored url unusable: {e}"));
            error!(
                code = err.code().as_str(),
                alias = %alias,
                error = %e,
                "stored url is not a valid Location header"
            );
            err
        })?;

        info!(alias = %alias, "redirecting");
        Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
    }
    .instrument(ctx.span("url.redirect"))
    .await
}
