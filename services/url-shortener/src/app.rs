//! HTTP application wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::Layer;

use crate::directory::UrlDirectory;
use crate::handlers::{admin, alias};
use crate::identity::PrivilegeDelegate;
use crate::jwt::TokenVerifier;
use crate::middleware::{
    authorization_gate, operator_gate, with_common_stages, FormatLayer, FormatService,
    GateState, OperatorCredentials,
};

/// Capabilities shared by the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Alias storage
    pub directory: Arc<dyn UrlDirectory>,
    /// Identity service admin mutations
    pub delegate: Arc<dyn PrivilegeDelegate>,
}

/// Everything the router needs, built once during startup.
pub struct AppDeps {
    /// Alias storage
    pub directory: Arc<dyn UrlDirectory>,
    /// Identity service admin mutations
    pub delegate: Arc<dyn PrivilegeDelegate>,
    /// Bearer token verification for `/url`
    pub verifier: Arc<dyn TokenVerifier>,
    /// Basic credentials required on `/user`
    pub operator: OperatorCredentials,
    /// Budget for a whole request
    pub request_timeout: Duration,
}

/// Router wrapped in format normalization, ready to serve.
pub type ShortenerService = FormatService<Router>;

/// Builds the full HTTP service.
///
/// Route groups:
/// - `/url`, `/url/{alias}`: authorization gate
/// - `/user`: operator gate
/// - `/{alias}`: public
pub fn build_app(deps: AppDeps) -> ShortenerService {
    let state = AppState {
        directory: deps.directory,
        delegate: deps.delegate,
    };
    let gate = GateState {
        verifier: deps.verifier,
    };
    let operator = Arc::new(deps.operator);

    let alias_routes = Router::new()
        .route("/url", post(alias::save_url))
        .route("/url/:alias", delete(alias::delete_url))
        .route_layer(axum::middleware::from_fn_with_state(
            gate,
            authorization_gate,
        ));

    let admin_routes = Router::new()
        .route(
            "/user",
            post(admin::grant_admin).delete(admin::revoke_admin),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            operator,
            operator_gate,
        ));

    let router = Router::new()
        .route("/:alias", get(alias::redirect))
        .merge(alias_routes)
        .merge(admin_routes)
        .with_state(state);

    FormatLayer.layer(with_common_stages(router, deps.request_timeout))
}
