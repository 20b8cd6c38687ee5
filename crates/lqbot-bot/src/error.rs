//! Application error types.

use lqbot_gateway::GatewayError;
use lqbot_mm::QuoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] lqbot_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single bot tick. Never fatal to the process.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl BotError {
    /// Metric label for the tick outcome this error produces.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Quote(e) if e.is_insufficient_balance() => "insufficient_balance",
            Self::Quote(_) => "quote_error",
            Self::Gateway(_) => "gateway_error",
        }
    }
}
