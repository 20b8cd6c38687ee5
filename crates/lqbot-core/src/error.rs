//! Error types for lqbot-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid precision: {0} (must be >= 0)")]
    InvalidPrecision(i32),

    #[error("Invalid market name: {0}")]
    InvalidMarketName(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
