//! URL Shortener Service - Main Entry Point

use std::process::ExitCode;
use std::sync::Arc;

use rust_common::{init_tracing, TracingConfig};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};
use url_shortener::directory;
use url_shortener::identity::GrpcPrivilegeDelegate;
use url_shortener::jwt::Hs256Verifier;
use url_shortener::lifecycle::wait_for_signal;
use url_shortener::middleware::OperatorCredentials;
use url_shortener::{build_app, AppDeps, Config, LifecycleError, ServiceLifecycle};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut tracing_config = TracingConfig::default()
        .with_service_name("url-shortener")
        .with_log_level(config.log_level.clone());
    if config.log_json {
        tracing_config = tracing_config.with_json_output();
    }
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("failed to initialize tracing: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => {
            info!("URL Shortener Service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "URL Shortener Service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    info!("Starting URL Shortener Service");
    let lifecycle = ServiceLifecycle::new(config.shutdown_timeout());

    let delegate = GrpcPrivilegeDelegate::new(&config.identity_client_config())
        .map_err(|e| lifecycle.abort(LifecycleError::dependency("identity client", e)))?;

    let directory = directory::connect(&config.storage_url)
        .await
        .map_err(|e| lifecycle.abort(LifecycleError::dependency("url directory", e)))?;

    let app = build_app(AppDeps {
        directory,
        delegate: Arc::new(delegate),
        verifier: Arc::new(Hs256Verifier::new(&config.app_secret)),
        operator: OperatorCredentials::new(
            config.operator_user.clone(),
            SecretString::from(config.operator_password.expose_secret().to_string()),
        ),
        request_timeout: config.request_timeout(),
    });

    let listener = lifecycle.bind(&config.listen_addr()).await?;
    lifecycle.serve(listener, app, wait_for_signal()).await
}
