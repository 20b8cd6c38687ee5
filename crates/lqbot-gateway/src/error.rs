//! Gateway error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Rejected by exchange (code {code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Parameter change detected: {0}")]
    ParamChange(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether the failure is an authentication or authorization problem.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthenticated(_) | Self::Unauthorized(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Unauthorized(_) => "unauthorized",
            Self::Unavailable(_) => "unavailable",
            Self::Rejected { .. } => "rejected",
            Self::UnknownMarket(_) => "unknown_market",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ParamChange(_) => "param_change",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
