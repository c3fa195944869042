use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::Url;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Upstream services the backend may forward to, keyed by the name used in
/// `/api/v1/upstream/{service}/...` and read from `UPSTREAM_{NAME}_URL`.
pub const UPSTREAM_SERVICES: [&str; 6] = ["auth", "notifications", "mailer", "llm", "cms", "billing"];

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig {
            path: env::var("DATABASE_PATH").unwrap_or_else(|_| "lien-ledger.db".to_string()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            upstream: UpstreamConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the SQLite database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY_DATABASE.to_string(),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_DATABASE
    }
}

/// Forwarding targets and the bounds applied to every forwarded call.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub timeout: Duration,
    /// Extra attempts for idempotent reads that time out or fail upstream.
    pub read_retries: u32,
    pub services: BTreeMap<String, Url>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            read_retries: 2,
            services: BTreeMap::new(),
        }
    }
}

impl UpstreamConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout = match env::var("UPSTREAM_TIMEOUT_MS") {
            Ok(value) => Duration::from_millis(parse_number("UPSTREAM_TIMEOUT_MS", &value)?),
            Err(_) => defaults.timeout,
        };
        let read_retries = match env::var("UPSTREAM_READ_RETRIES") {
            Ok(value) => parse_number("UPSTREAM_READ_RETRIES", &value)?,
            Err(_) => defaults.read_retries,
        };

        let mut services = BTreeMap::new();
        for name in UPSTREAM_SERVICES {
            let variable = format!("UPSTREAM_{}_URL", name.to_ascii_uppercase());
            let Ok(raw) = env::var(&variable) else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }
            let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidUrl {
                name: variable.clone(),
                reason: err.to_string(),
            })?;
            services.insert(name.to_string(), url);
        }

        Ok(Self {
            timeout,
            read_retries,
            services,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidUrl { name: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidUrl { name, reason } => {
                write!(f, "{name} is not a valid URL: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidUrl { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "DATABASE_PATH",
            "UPSTREAM_TIMEOUT_MS",
            "UPSTREAM_READ_RETRIES",
        ] {
            env::remove_var(name);
        }
        for service in UPSTREAM_SERVICES {
            env::remove_var(format!("UPSTREAM_{}_URL", service.to_ascii_uppercase()));
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.database.path, "lien-ledger.db");
        assert!(!config.database.is_in_memory());
        assert_eq!(config.upstream.timeout, Duration::from_secs(10));
        assert_eq!(config.upstream.read_retries, 2);
        assert!(config.upstream.services.is_empty());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_database_and_upstream_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DATABASE_PATH", ":memory:");
        env::set_var("UPSTREAM_TIMEOUT_MS", "250");
        env::set_var("UPSTREAM_READ_RETRIES", "0");
        env::set_var("UPSTREAM_MAILER_URL", "http://mailer.internal:8025/");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert!(config.database.is_in_memory());
        assert_eq!(config.upstream.timeout, Duration::from_millis(250));
        assert_eq!(config.upstream.read_retries, 0);
        assert_eq!(
            config.upstream.services.get("mailer").map(Url::as_str),
            Some("http://mailer.internal:8025/")
        );
        assert!(!config.upstream.services.contains_key("billing"));
    }

    #[test]
    fn rejects_malformed_upstream_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPSTREAM_CMS_URL", "not a url");
        let err = AppConfig::load().expect_err("bad url rejected");
        reset_env();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
