//! Server configuration for the OPTIMADE gateway.
//!
//! This module provides configuration types for the HTTP server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OPTIGATE_SERVER_PORT` | 5000 | Server port |
//! | `OPTIGATE_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `OPTIGATE_LOG_LEVEL` | info | Log level |
//! | `OPTIGATE_REQUEST_TIMEOUT` | 120 | Request timeout (seconds) |
//! | `OPTIGATE_ENABLE_CORS` | true | Enable CORS |
//! | `OPTIGATE_CORS_ORIGINS` | * | Allowed origins |
//! | `OPTIGATE_CORS_METHODS` | GET,POST,OPTIONS | Allowed methods |
//! | `OPTIGATE_CORS_HEADERS` | * | Allowed headers |
//! | `OPTIGATE_ENABLE_REQUEST_ID` | true | Set and propagate `x-request-id` |
//! | `OPTIGATE_BASE_URL` | http://localhost:5000 | External base URL |
//! | `OPTIGATE_STORAGE_BACKEND` | memory | `memory` or `sqlite` |
//! | `OPTIGATE_DATABASE_URL` | - | SQLite database path |
//! | `OPTIGATE_DEFAULT_PAGE_LIMIT` | 20 | Default `page_limit` |
//! | `OPTIGATE_MAX_PAGE_LIMIT` | 500 | Largest accepted `page_limit` |
//! | `OPTIGATE_BACKEND_TIMEOUT` | 60 | Per-backend request timeout (seconds) |
//! | `OPTIGATE_QUERY_POLL_INTERVAL_MS` | 200 | Query poll interval while awaiting |
//! | `OPTIGATE_DEFAULT_SEARCH_TIMEOUT` | 15 | Default `timeout` of `GET /search` (seconds) |
//! | `OPTIGATE_MAX_PAGINATION_PAGES` | - | Page bound of bulk inventory walks |
//! | `OPTIGATE_LOAD_PROVIDERS_DATABASES` | false | Register databases from the providers directory |
//! | `OPTIGATE_PROVIDERS_URL` | https://providers.optimade.org/v1/links | Providers directory |
//!
//! # Example
//!
//! ```rust
//! use optigate_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 8081,
//!     host: "0.0.0.0".to_string(),
//!     enable_cors: true,
//!     ..Default::default()
//! };
//! assert_eq!(config.socket_addr(), "0.0.0.0:8081");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use optigate_federation::GatewaySettings;
use optigate_federation::providers::PROVIDERS_URL;

/// Which resource store backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendMode {
    /// In-process store; all state is lost on restart.
    Memory,
    /// SQLite file (or `:memory:`) through a connection pool.
    Sqlite,
}

impl fmt::Display for StorageBackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackendMode::Memory => write!(f, "memory"),
            StorageBackendMode::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageBackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackendMode::Memory),
            "sqlite" => Ok(StorageBackendMode::Sqlite),
            other => Err(format!(
                "unknown storage backend '{}' (expected 'memory' or 'sqlite')",
                other
            )),
        }
    }
}

/// Server configuration for the gateway.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "optigate")]
#[command(about = "OPTIMADE federating gateway")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "OPTIGATE_SERVER_PORT", default_value = "5000")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "OPTIGATE_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "OPTIGATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "OPTIGATE_REQUEST_TIMEOUT", default_value = "120")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "OPTIGATE_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "OPTIGATE_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "OPTIGATE_CORS_METHODS", default_value = "GET,POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(long, env = "OPTIGATE_CORS_HEADERS", default_value = "*")]
    pub cors_headers: String,

    /// Set an `x-request-id` on requests that lack one and echo it back.
    #[arg(long, env = "OPTIGATE_ENABLE_REQUEST_ID", default_value = "true")]
    pub enable_request_id: bool,

    /// External base URL (used in next links and query redirects).
    #[arg(long, env = "OPTIGATE_BASE_URL", default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Resource store: `memory` or `sqlite`.
    #[arg(long, env = "OPTIGATE_STORAGE_BACKEND", default_value = "memory")]
    pub storage_backend: String,

    /// SQLite database path (`:memory:` allowed).
    #[arg(long, env = "OPTIGATE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// `page_limit` used when a request sets none.
    #[arg(long, env = "OPTIGATE_DEFAULT_PAGE_LIMIT", default_value = "20")]
    pub default_page_limit: usize,

    /// Largest accepted `page_limit`.
    #[arg(long, env = "OPTIGATE_MAX_PAGE_LIMIT", default_value = "500")]
    pub max_page_limit: usize,

    /// Timeout of one backend request in seconds.
    #[arg(long, env = "OPTIGATE_BACKEND_TIMEOUT", default_value = "60")]
    pub backend_timeout: u64,

    /// Interval at which a waiting search polls its query, in milliseconds.
    #[arg(long, env = "OPTIGATE_QUERY_POLL_INTERVAL_MS", default_value = "200")]
    pub query_poll_interval_ms: u64,

    /// Seconds `GET /search` waits for a query before redirecting.
    #[arg(long, env = "OPTIGATE_DEFAULT_SEARCH_TIMEOUT", default_value = "15")]
    pub default_search_timeout: u64,

    /// Upper bound on pages fetched per backend by bulk inventory walks.
    #[arg(long, env = "OPTIGATE_MAX_PAGINATION_PAGES")]
    pub max_pagination_pages: Option<usize>,

    /// Register databases from the OPTIMADE providers directory at startup.
    #[arg(long, env = "OPTIGATE_LOAD_PROVIDERS_DATABASES", default_value = "false")]
    pub load_providers_databases: bool,

    /// URL of the providers directory `links` endpoint.
    #[arg(long, env = "OPTIGATE_PROVIDERS_URL", default_value = PROVIDERS_URL)]
    pub providers_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 120,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,OPTIONS".to_string(),
            cors_headers: "*".to_string(),
            enable_request_id: true,
            base_url: "http://localhost:5000".to_string(),
            storage_backend: "memory".to_string(),
            database_url: None,
            default_page_limit: 20,
            max_page_limit: 500,
            backend_timeout: 60,
            query_poll_interval_ms: 200,
            default_search_timeout: 15,
            max_pagination_pages: None,
            load_providers_databases: false,
            providers_url: PROVIDERS_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        Self::try_parse_from(["optigate"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Parses the configured storage backend.
    pub fn storage_backend_mode(&self) -> Result<StorageBackendMode, String> {
        self.storage_backend.parse()
    }

    /// Default timeout of `GET /search`.
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.default_search_timeout)
    }

    /// Settings for the federation engine.
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            base_url: self.base_url().to_string(),
            backend_timeout: Duration::from_secs(self.backend_timeout),
            poll_interval: Duration::from_millis(self.query_poll_interval_ms),
            default_page_limit: self.default_page_limit,
            max_pagination_pages: self.max_pagination_pages,
            ..GatewaySettings::default()
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.backend_timeout == 0 {
            errors.push("Backend timeout cannot be 0".to_string());
        }

        if self.query_poll_interval_ms == 0 {
            errors.push("Query poll interval cannot be 0".to_string());
        }

        if self.default_page_limit == 0 {
            errors.push("Default page limit cannot be 0".to_string());
        }

        if self.default_page_limit > self.max_page_limit {
            errors.push("Default page limit cannot exceed max page limit".to_string());
        }

        if self.max_pagination_pages == Some(0) {
            errors.push("Max pagination pages cannot be 0".to_string());
        }

        if let Err(e) = url::Url::parse(&self.base_url) {
            errors.push(format!("Invalid base URL '{}': {}", self.base_url, e));
        }

        if self.load_providers_databases {
            if let Err(e) = url::Url::parse(&self.providers_url) {
                errors.push(format!("Invalid providers URL '{}': {}", self.providers_url, e));
            }
        }

        if let Err(e) = self.storage_backend_mode() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0, short timeouts and a fast poll interval,
    /// and disables features that might interfere with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            enable_cors: false,
            enable_request_id: false,
            backend_timeout: 5,
            query_poll_interval_ms: 10,
            default_search_timeout: 2,
            default_page_limit: 10,
            max_page_limit: 100,
            ..Self::default()
        }
    }
}
