use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::reputation::RankingMode;

/// Configuration for the reputation API server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Store configuration
    pub database: DatabaseConfig,
    /// Cross-origin configuration
    pub cors: CorsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Top-N ranking configuration
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file written by the ingestion pipeline
    pub path: PathBuf,
    /// Pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before reporting unavailable
    pub acquire_timeout_secs: u64,
    /// Open the file read-only
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Preflight cache lifetime in seconds
    pub max_age_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Enable request/response logging
    pub log_requests: bool,
    /// Mask client IPs in request logs
    pub sanitize_logs: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Approximate (truncate before re-sorting) or exact ranking for `top`
    pub mode: RankingMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("repowr_data/reputation.db"),
            max_connections: 5,
            acquire_timeout_secs: 5,
            read_only: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig::default(),
            cors: CorsConfig {
                max_age_secs: 86_400,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
                sanitize_logs: true,
            },
            ranking: RankingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server configuration
        if let Some(host) = lookup("REPOWR_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("REPOWR_PORT") {
            config.server.port = port.parse().context("Invalid REPOWR_PORT value")?;
        }

        // Database configuration
        if let Some(path) = lookup("REPOWR_DB_PATH") {
            config.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("REPOWR_DB_MAX_CONNECTIONS") {
            config.database.max_connections = max
                .parse()
                .context("Invalid REPOWR_DB_MAX_CONNECTIONS value")?;
        }

        if let Some(secs) = lookup("REPOWR_DB_ACQUIRE_TIMEOUT_SECS") {
            config.database.acquire_timeout_secs = secs
                .parse()
                .context("Invalid REPOWR_DB_ACQUIRE_TIMEOUT_SECS value")?;
        }

        if let Some(read_only) = lookup("REPOWR_DB_READ_ONLY") {
            config.database.read_only = read_only
                .parse()
                .context("Invalid REPOWR_DB_READ_ONLY value")?;
        }

        // CORS configuration
        if let Some(max_age) = lookup("REPOWR_CORS_MAX_AGE_SECS") {
            config.cors.max_age_secs = max_age
                .parse()
                .context("Invalid REPOWR_CORS_MAX_AGE_SECS value")?;
        }

        // Logging configuration
        if let Some(level) = lookup("REPOWR_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(log_requests) = lookup("REPOWR_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid REPOWR_LOG_REQUESTS value")?;
        }

        if let Some(sanitize) = lookup("REPOWR_SANITIZE_LOGS") {
            config.logging.sanitize_logs = sanitize
                .parse()
                .context("Invalid REPOWR_SANITIZE_LOGS value")?;
        }

        // Ranking configuration
        if let Some(mode) = lookup("REPOWR_TOP_RANKING") {
            config.ranking.mode = mode
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid REPOWR_TOP_RANKING value")?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Database path cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("Database pool needs at least one connection"));
        }

        if !self.database.read_only {
            warn!("Store opened read-write; this service never writes to it");
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
