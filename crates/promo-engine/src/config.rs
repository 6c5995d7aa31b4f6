//! Engine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.

use std::env;
use std::time::Duration;

/// Validation service configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Deadline around the atomic reservation step, in milliseconds.
    ///
    /// On expiry the caller sees the retryable `temporarily_unavailable`
    /// outcome instead of blocking indefinitely. The cancelled transaction
    /// rolls back, so nothing is half-applied.
    pub reserve_timeout_ms: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                  | Default           |
    /// |---------------------------|-------------------|
    /// | `PROMO_DATABASE_PATH`     | `./promo.db`      |
    /// | `PROMO_RESERVE_TIMEOUT_MS`| `2000`            |
    pub fn load() -> Result<Self, ConfigError> {
        let config = EngineConfig {
            database_path: env::var("PROMO_DATABASE_PATH")
                .unwrap_or_else(|_| "./promo.db".to_string()),

            reserve_timeout_ms: env::var("PROMO_RESERVE_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PROMO_RESERVE_TIMEOUT_MS".to_string()))?,
        };

        if config.reserve_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PROMO_RESERVE_TIMEOUT_MS".to_string(),
            ));
        }

        Ok(config)
    }

    /// The reserve deadline as a Duration.
    pub fn reserve_timeout(&self) -> Duration {
        Duration::from_millis(self.reserve_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: "./promo.db".to_string(),
            reserve_timeout_ms: 2000,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
