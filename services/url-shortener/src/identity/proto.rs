//! Messages and client for the identity service `auth.Permissions` API.
//!
//! Declared with prost derives instead of generated from a `.proto` file, so
//! the build does not depend on `protoc`. Field tags match the service
//! definition:
//!
//! ```text
//! service Permissions {
//!   rpc SetAdmin(SetAdminRequest) returns (SetAdminResponse);
//!   rpc DeleteAdmin(DeleteAdminRequest) returns (DeleteAdminResponse);
//! }
//! ```

use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

/// Grants admin status to a user of an application.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct SetAdminRequest {
    /// User identity (email)
    #[prost(string, tag = "1")]
    pub email: String,
    /// Application the admin status applies to
    #[prost(int32, tag = "2")]
    pub app_id: i32,
}

/// Result of `SetAdmin`.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct SetAdminResponse {
    /// Whether the user is an admin after the call
    #[prost(bool, tag = "1")]
    pub is_admin: bool,
}

/// Revokes admin status from a user of an application.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct DeleteAdminRequest {
    /// User identity (email)
    #[prost(string, tag = "1")]
    pub email: String,
    /// Application the admin status applies to
    #[prost(int32, tag = "2")]
    pub app_id: i32,
}

/// Result of `DeleteAdmin`.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct DeleteAdminResponse {
    /// Whether the admin status was removed
    #[prost(bool, tag = "1")]
    pub is_deleted: bool,
}

const SET_ADMIN_PATH: &str = "/auth.Permissions/SetAdmin";
const DELETE_ADMIN_PATH: &str = "/auth.Permissions/DeleteAdmin";

/// gRPC client for `auth.Permissions`.
#[derive(Debug, Clone)]
pub struct PermissionsClient {
    inner: tonic::client::Grpc<Channel>,
}

impl PermissionsClient {
    /// Creates a client over an established or lazy channel.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Calls `SetAdmin`.
    pub async fn set_admin(
        &mut self,
        request: Request<SetAdminRequest>,
    ) -> Result<Response<SetAdminResponse>, Status> {
        self.unary(request, SET_ADMIN_PATH).await
    }

    /// Calls `DeleteAdmin`.
    pub async fn delete_admin(
        &mut self,
        request: Request<DeleteAdminRequest>,
    ) -> Result<Response<DeleteAdminResponse>, Status> {
        self.unary(request, DELETE_ADMIN_PATH).await
    }

    async fn unary<Req, Resp>(
        &mut self,
        request: Request<Req>,
        path: &'static str,
    ) -> Result<Response<Resp>, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unavailable(format!("identity service not ready: {e}")))?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        self.inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await
    }
}
