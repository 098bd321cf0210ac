//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before giving up.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

impl DatabaseConfig {
    /// Returns the connection acquire timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Attempts per balance-changing operation, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff step between conflicting attempts, in milliseconds.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
    /// Coins granted to a freshly opened account.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    100
}

fn default_starting_balance() -> i64 {
    1000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            starting_balance: default_starting_balance(),
        }
    }
}

impl LedgerConfig {
    /// Returns the backoff step as a `Duration`.
    #[must_use]
    pub const fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }
}

impl AppConfig {
    /// Loads `.env` if present, then configuration from environment and
    /// config files.
    ///
    /// Sources, lowest priority first: `config/default`, `config/{RUN_MODE}`,
    /// then `MERCHLEDGER__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_sources()
    }

    /// Loads configuration like [`AppConfig::load`] without reading `.env`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn from_sources() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("MERCHLEDGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.max_attempts, 3);
        assert_eq!(ledger.backoff_step(), Duration::from_millis(100));
        assert_eq!(ledger.starting_balance, 1000);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("MERCHLEDGER__DATABASE__URL", Some("postgres://localhost/merch")),
                ("MERCHLEDGER__DATABASE__MAX_CONNECTIONS", Some("25")),
                ("MERCHLEDGER__LEDGER__MAX_ATTEMPTS", Some("5")),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                let config = AppConfig::from_sources().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/merch");
                assert_eq!(config.database.max_connections, 25);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.database.connect_timeout(), Duration::from_secs(8));
                assert_eq!(config.ledger.max_attempts, 5);
                assert_eq!(config.ledger.backoff_step_ms, 100);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("MERCHLEDGER__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                let err = AppConfig::from_sources().unwrap_err();
                assert!(err.to_string().contains("url"), "unexpected error: {err}");
            },
        );
    }
}
