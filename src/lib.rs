//! Single-vote election core
//!
//! Verifies a voter, records exactly one vote per voter through an optimistic
//! document-store transaction, and reports live tallies.

pub mod api;
pub mod config;
pub mod display;
pub mod errors;
pub mod services;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use api::VoteChain;
pub use errors::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with `RUST_LOG`, defaulting to `votechain=info`
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "votechain=info".into()),
        )
        .try_init()
        .map_err(|e| Error::internal(format!("Logging already initialized: {e}")))?;

    tracing::info!("🗳️  Voting system v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging from a [`config::LoggingConfig`]
pub fn init_with(logging: &config::LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(&logging.level)
        .map_err(|_| Error::validation(format!("invalid log filter {}", logging.level)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::internal(format!("Logging already initialized: {e}")))?;

    tracing::info!("🗳️  Voting system v{} initialized", VERSION);
    Ok(())
}
