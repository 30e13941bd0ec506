/// Configuration management for the credential relay
use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Value of the `version` header when a caller does not send one
    pub api_version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
}

/// Remote issuer and verifier applications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub issuer_url: String,
    pub verifier_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> RelayResult<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(RelayError::Validation(format!("Invalid log format: {}", s))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> RelayResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RelayError::Validation(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> RelayResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("RELAY_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = parse_var("RELAY_PORT", 3030u16)?;
        let api_version = env::var("RELAY_API_VERSION").unwrap_or_else(|_| "3.0.0".to_string());

        let database_url = env::var("RELAY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/relay.sqlite".to_string());
        let max_connections = parse_var("RELAY_DATABASE_MAX_CONNECTIONS", 10u32)?;

        let issuer_url = env::var("RELAY_ISSUER_URL")
            .map_err(|_| RelayError::Validation("RELAY_ISSUER_URL is required".to_string()))?;
        let verifier_url = env::var("RELAY_VERIFIER_URL")
            .map_err(|_| RelayError::Validation("RELAY_VERIFIER_URL is required".to_string()))?;
        let timeout_secs = parse_var("RELAY_REMOTE_TIMEOUT_SECS", 30u64)?;
        let user_agent = env::var("RELAY_USER_AGENT")
            .unwrap_or_else(|_| format!("credential-relay/{}", env!("CARGO_PKG_VERSION")));

        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "credential_relay=debug,tower_http=debug".to_string());
        let format = match env::var("RELAY_LOG_FORMAT") {
            Ok(raw) => LogFormat::from_str(&raw)?,
            Err(_) => LogFormat::Pretty,
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                api_version,
            },
            storage: StorageConfig {
                database_url,
                max_connections,
            },
            remote: RemoteConfig {
                issuer_url: issuer_url.trim_end_matches('/').to_string(),
                verifier_url: verifier_url.trim_end_matches('/').to_string(),
                timeout_secs,
                user_agent,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Configuration for tests: in-memory database and the given remote base URLs
    pub fn for_testing(issuer_url: &str, verifier_url: &str) -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 0,
                api_version: "3.0.0".to_string(),
            },
            storage: StorageConfig {
                database_url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            remote: RemoteConfig {
                issuer_url: issuer_url.trim_end_matches('/').to_string(),
                verifier_url: verifier_url.trim_end_matches('/').to_string(),
                timeout_secs: 5,
                user_agent: "credential-relay-test".to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> RelayResult<()> {
        if self.service.hostname.is_empty() {
            return Err(RelayError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.service.api_version.is_empty() {
            return Err(RelayError::Validation("API version cannot be empty".to_string()));
        }

        if self.storage.max_connections == 0 {
            return Err(RelayError::Validation(
                "Database pool needs at least one connection".to_string(),
            ));
        }

        for (name, url) in [
            ("issuer", &self.remote.issuer_url),
            ("verifier", &self.remote.verifier_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(RelayError::Validation(format!(
                    "{} URL must be http(s): {}",
                    name, url
                )));
            }
        }

        Ok(())
    }
}
