//! Type-Safe Configuration with Validation
//!
//! Provides type-safe configuration with URL validation and environment variable support.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: String, reason: String },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid timeout value
    #[error("Invalid timeout for {0}: must be greater than 0")]
    InvalidTimeout(String),

    /// Unsupported storage backend
    #[error("Unsupported storage scheme: {0}")]
    UnsupportedStorage(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Identity calls could outlast the request they serve
    #[error(
        "identity calls may take {identity:?} with retries, \
         which does not fit REQUEST_TIMEOUT of {request:?}"
    )]
    IdentityBudgetExceeded {
        /// Worst-case duration of one delegated call
        identity: Duration,
        /// Per-request timeout
        request: Duration,
    },

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError { name: String, reason: String },
}

/// Service configuration with validation.
#[derive(Debug)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Graceful shutdown drain window in seconds
    pub shutdown_timeout_secs: u64,
    /// Identity service gRPC endpoint
    pub identity_service_url: Url,
    /// Per-attempt timeout for identity service calls in seconds
    pub identity_timeout_secs: u64,
    /// Retries for transient identity service failures
    pub identity_retries: u32,
    /// Operator basic-auth user name
    pub operator_user: String,
    /// Operator basic-auth password
    pub operator_password: SecretString,
    /// HS256 secret shared with the identity service
    pub app_secret: SecretString,
    /// Alias storage location (`redis://` or `memory://`)
    pub storage_url: Url,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let config = Self {
            host: vars.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse("PORT", 8082)?,
            request_timeout_secs: vars.parse("REQUEST_TIMEOUT", 4)?,
            shutdown_timeout_secs: vars.parse("SHUTDOWN_TIMEOUT", 5)?,
            identity_service_url: vars.url("IDENTITY_SERVICE_URL", "http://localhost:44044")?,
            identity_timeout_secs: vars.parse("IDENTITY_TIMEOUT", 1)?,
            identity_retries: vars.parse("IDENTITY_RETRIES", 2)?,
            operator_user: vars.required("OPERATOR_USER")?,
            operator_password: SecretString::from(vars.required("OPERATOR_PASSWORD")?),
            app_secret: SecretString::from(vars.required("APP_SECRET")?),
            storage_url: vars.url("STORAGE_URL", "redis://127.0.0.1:6379")?,
            log_level: vars.get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: vars.parse("LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("REQUEST_TIMEOUT".to_string()));
        }
        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("SHUTDOWN_TIMEOUT".to_string()));
        }
        if self.identity_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("IDENTITY_TIMEOUT".to_string()));
        }
        if self.operator_user.is_empty() {
            return Err(ConfigError::MissingRequired("OPERATOR_USER".to_string()));
        }
        if self.app_secret.expose_secret().is_empty() {
            return Err(ConfigError::MissingRequired("APP_SECRET".to_string()));
        }
        match self.storage_url.scheme() {
            "redis" | "rediss" | "memory" => {}
            other => return Err(ConfigError::UnsupportedStorage(other.to_string())),
        }

        // A delegated call must finish, retries included, before the request
        // timeout fires, so its failure is reported as a delegate error.
        let identity = self.identity_client_config().max_call_duration();
        let request = self.request_timeout();
        if identity >= request {
            return Err(ConfigError::IdentityBudgetExceeded { identity, request });
        }
        Ok(())
    }

    /// Address the HTTP listener binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Drain window granted to in-flight requests on shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Creates an IdentityClientConfig from this config.
    #[must_use]
    pub fn identity_client_config(&self) -> crate::identity::IdentityClientConfig {
        crate::identity::IdentityClientConfig::new(self.identity_service_url.clone())
            .with_timeout(Duration::from_secs(self.identity_timeout_secs))
            .with_retries(self.identity_retries)
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired(name.to_string()))
    }

    /// Parse a variable with a default value.
    fn parse<T: std::str::FromStr>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Parse a URL variable with a default value.
    fn url(&self, name: &str, default: &str) -> Result<Url, ConfigError> {
        let url_str = self.get(name).unwrap_or_else(|| default.to_string());
        Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
            field: name.to_string(),
            reason: e.to_string(),
        })
    }
}
