//! Startup and runtime error types for the Lux host.

use lux_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the Lux host.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Signal handling or other I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A domain operation failed at startup or shutdown.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
