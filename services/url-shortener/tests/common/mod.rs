//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::SecretString;
use url_shortener::directory::{MemoryDirectory, UrlDirectory};
use url_shortener::identity::{CallContext, DelegateError, PrivilegeDelegate};
use url_shortener::jwt::{Claims, Hs256Verifier};
use url_shortener::middleware::OperatorCredentials;
use url_shortener::{build_app, AppDeps, ShortenerService};

pub const APP_SECRET: &str = "integration-secret";
pub const OPERATOR_USER: &str = "operator";
pub const OPERATOR_PASSWORD: &str = "correct horse";

/// Delegate returning a scripted outcome and recording forwarded credentials.
pub struct FakeDelegate {
    outcome: fn() -> Result<bool, DelegateError>,
    delay: Duration,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl FakeDelegate {
    pub fn new(outcome: fn() -> Result<bool, DelegateError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn granting() -> Self {
        Self::new(|| Ok(true))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    async fn record(&self, ctx: &CallContext) -> Result<bool, DelegateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .push(ctx.credential().header_value());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.outcome)()
    }
}

#[async_trait]
impl PrivilegeDelegate for FakeDelegate {
    async fn grant_admin(
        &self,
        ctx: &CallContext,
        _identity: &str,
        _app_id: i32,
    ) -> Result<bool, DelegateError> {
        self.record(ctx).await
    }

    async fn revoke_admin(
        &self,
        ctx: &CallContext,
        _identity: &str,
        _app_id: i32,
    ) -> Result<bool, DelegateError> {
        self.record(ctx).await
    }
}

pub fn app_with(
    directory: Arc<dyn UrlDirectory>,
    delegate: Arc<dyn PrivilegeDelegate>,
    request_timeout: Duration,
) -> ShortenerService {
    build_app(AppDeps {
        directory,
        delegate,
        verifier: Arc::new(Hs256Verifier::new(&SecretString::from(APP_SECRET))),
        operator: OperatorCredentials::new(OPERATOR_USER, SecretString::from(OPERATOR_PASSWORD)),
        request_timeout,
    })
}

pub fn app(directory: Arc<MemoryDirectory>, delegate: Arc<FakeDelegate>) -> ShortenerService {
    app_with(directory, delegate, Duration::from_secs(5))
}

pub fn operator_header() -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{OPERATOR_USER}:{OPERATOR_PASSWORD}"))
    )
}

pub fn token(secret: &str, exp_offset: i64) -> String {
    let claims = Claims {
        uid: 1,
        email: "caller@example.com".to_string(),
        app_id: 1,
        exp: chrono::Utc::now().timestamp() + exp_offset,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn valid_bearer() -> String {
    format!("Bearer {}", token(APP_SECRET, 3600))
}
