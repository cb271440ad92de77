//! URL Shortener Service - short aliases with delegated admin management.
//!
//! This crate provides the HTTP surface for creating, resolving and deleting
//! aliases, the authorization pipeline in front of it, and the gRPC delegate
//! that forwards admin mutations to the identity service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod context;
pub mod credential;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod jwt;
pub mod lifecycle;
pub mod middleware;

pub use app::{build_app, AppDeps, AppState, ShortenerService};
pub use config::Config;
pub use credential::{Credential, CredentialError};
pub use error::{ApiError, ErrorCode, StandardResponse};
pub use lifecycle::{LifecycleError, LifecycleState, ServiceLifecycle};
