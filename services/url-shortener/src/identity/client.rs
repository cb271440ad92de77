//! gRPC-backed [`PrivilegeDelegate`].
//!
//! Provides integration with the identity service with bounded retries for
//! transient failures.

use std::time::Duration;

use async_trait::async_trait;
use rust_common::{RetryConfig, RetryPolicy};
use thiserror::Error;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, instrument};
use url::Url;

use super::proto::{DeleteAdminRequest, PermissionsClient, SetAdminRequest};
use super::{CallContext, DelegateError, PrivilegeDelegate};

/// Identity client construction errors.
#[derive(Error, Debug)]
pub enum IdentityClientError {
    /// Invalid configuration
    #[error("Invalid identity client configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for [`GrpcPrivilegeDelegate`].
#[derive(Debug, Clone)]
pub struct IdentityClientConfig {
    /// Identity service endpoint
    pub service_url: Url,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub retries: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
}

impl IdentityClientConfig {
    /// Creates a configuration for `service_url` with default retry settings.
    #[must_use]
    pub const fn new(service_url: Url) -> Self {
        Self {
            service_url,
            timeout: Duration::from_secs(1),
            retries: 2,
            initial_backoff: Duration::from_millis(100),
        }
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff before the first retry.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn validate(&self) -> Result<(), IdentityClientError> {
        if self.timeout.is_zero() {
            return Err(IdentityClientError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }
        match self.service_url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(IdentityClientError::InvalidConfig(format!(
                "unsupported scheme: {other}"
            ))),
        }
    }

    /// Longest a single delegated call can take, retries and backoff included.
    #[must_use]
    pub fn max_call_duration(&self) -> Duration {
        self.retry_policy().max_elapsed().unwrap_or(Duration::MAX)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            RetryConfig::default()
                .with_max_retries(self.retries)
                .with_initial_delay(self.initial_backoff)
                .with_attempt_timeout(self.timeout),
        )
    }
}

/// Admin mutations forwarded to the identity service over gRPC.
#[derive(Debug, Clone)]
pub struct GrpcPrivilegeDelegate {
    client: PermissionsClient,
    retry: RetryPolicy,
}

impl GrpcPrivilegeDelegate {
    /// Creates a delegate with a lazily connected channel.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(config: &IdentityClientConfig) -> Result<Self, IdentityClientError> {
        config.validate()?;

        let channel: Channel = Endpoint::from_shared(config.service_url.to_string())
            .map_err(|e| IdentityClientError::InvalidConfig(format!("Invalid URL: {e}")))?
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .connect_lazy();

        Ok(Self {
            client: PermissionsClient::new(channel),
            retry: config.retry_policy(),
        })
    }
}

/// Wraps a message into a request carrying the caller's credential.
fn authorized_request<T>(ctx: &CallContext, message: T) -> Result<Request<T>, Status> {
    let mut request = Request::new(message);

    let authorization: MetadataValue<Ascii> = ctx
        .credential()
        .header_value()
        .parse()
        .map_err(|_| Status::invalid_argument("credential is not a valid metadata value"))?;
    request.metadata_mut().insert("authorization", authorization);

    if let Ok(request_id) = ctx.request_id().parse::<MetadataValue<Ascii>>() {
        request.metadata_mut().insert("x-request-id", request_id);
    }

    Ok(request)
}

#[async_trait]
impl PrivilegeDelegate for GrpcPrivilegeDelegate {
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    async fn grant_admin(
        &self,
        ctx: &CallContext,
        identity: &str,
        app_id: i32,
    ) -> Result<bool, DelegateError> {
        let response = self
            .retry
            .execute(|| {
                let mut client = self.client.clone();
                let request = authorized_request(
                    ctx,
                    SetAdminRequest {
                        email: identity.to_string(),
                        app_id,
                    },
                );
                async move { client.set_admin(request?).await }
            })
            .await?;

        let is_admin = response.into_inner().is_admin;
        debug!(is_admin, "SetAdmin completed");
        Ok(is_admin)
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    async fn revoke_admin(
        &self,
        ctx: &CallContext,
        identity: &str,
        app_id: i32,
    ) -> Result<bool, DelegateError> {
        let response = self
            .retry
            .execute(|| {
                let mut client = self.client.clone();
                let request = authorized_request(
                    ctx,
                    DeleteAdminRequest {
                        email: identity.to_string(),
                        app_id,
                    },
                );
                async move { client.delete_admin(request?).await }
            })
            .await?;

        let is_deleted = response.into_inner().is_deleted;
        debug!(is_deleted, "DeleteAdmin completed");
        Ok(is_deleted)
    }
}
