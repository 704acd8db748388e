//! Configuration management for the voting system
//!
//! Loads settings from environment variables (and an optional `.env` file)
//! with validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Identifier the placeholder resolver hands out in place of real recognition
pub const DEFAULT_PLACEHOLDER_VOTER_ID: &str = "VOTE-SH-67890";

/// Transaction settings for the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Commit attempts before a conflict is surfaced (default: 5)
    pub max_transaction_attempts: u32,

    /// Base delay between conflicting attempts in milliseconds
    pub retry_backoff_ms: u64,

    /// Upper bound for a whole transaction, retries included (default: 10s)
    pub transaction_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_transaction_attempts: 5,
            retry_backoff_ms: 10,
            transaction_timeout_ms: 10_000,
        }
    }
}

impl StoreConfig {
    /// Load store configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            max_transaction_attempts: env_or(
                "VOTECHAIN_TX_MAX_ATTEMPTS",
                defaults.max_transaction_attempts,
            )?,
            retry_backoff_ms: env_or("VOTECHAIN_TX_BACKOFF_MS", defaults.retry_backoff_ms)?,
            transaction_timeout_ms: env_or(
                "VOTECHAIN_TX_TIMEOUT_MS",
                defaults.transaction_timeout_ms,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for testing: many contenders, fast retries
    pub fn for_testing() -> Self {
        Self {
            max_transaction_attempts: 64,
            retry_backoff_ms: 1,
            transaction_timeout_ms: 5_000,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_transaction_attempts == 0 {
            return Err(Error::validation("max_transaction_attempts must be at least 1"));
        }
        if self.transaction_timeout_ms == 0 {
            return Err(Error::validation("transaction_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

/// Identity verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Voter identifier returned by the placeholder resolver
    pub placeholder_voter_id: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            placeholder_voter_id: DEFAULT_PLACEHOLDER_VOTER_ID.to_string(),
        }
    }
}

/// Results refresh and demo seeding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Seconds between result refreshes (default: 30)
    pub refresh_interval_seconds: u64,

    /// JSON file with voters and candidates to load into an in-memory store
    pub seed_file: Option<PathBuf>,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 30,
            seed_file: None,
        }
    }
}

impl ResultsConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `votechain=debug`
    pub level: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub verification: VerificationConfig,
    pub results: ResultsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store = StoreConfig::from_env()?;

        let verification = VerificationConfig {
            placeholder_voter_id: std::env::var("VOTECHAIN_PLACEHOLDER_VOTER_ID")
                .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_VOTER_ID.to_string()),
        };
        if verification.placeholder_voter_id.trim().is_empty() {
            return Err(Error::validation("VOTECHAIN_PLACEHOLDER_VOTER_ID must not be empty"));
        }

        let results = ResultsConfig {
            refresh_interval_seconds: env_or("VOTECHAIN_RESULTS_REFRESH_SECONDS", 30)?,
            seed_file: std::env::var("VOTECHAIN_SEED_FILE").ok().map(PathBuf::from),
        };
        if results.refresh_interval_seconds == 0 {
            return Err(Error::validation("VOTECHAIN_RESULTS_REFRESH_SECONDS must be positive"));
        }

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "votechain=info".to_string()),
        };

        Ok(Self {
            store,
            verification,
            results,
            logging,
        })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            store: StoreConfig::for_testing(),
            verification: VerificationConfig::default(),
            results: ResultsConfig {
                refresh_interval_seconds: 1,
                seed_file: None,
            },
            logging: LoggingConfig {
                level: "votechain=debug".to_string(),
            },
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset
fn env_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::internal(format!("Invalid {name}"))),
        Err(_) => Ok(default),
    }
}
