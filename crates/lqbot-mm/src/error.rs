//! Quote engine error types.
//!
//! Every variant is raised locally, before any order reaches the exchange.

use lqbot_core::CoreError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Invalid deviation: {0} (must be > 1)")]
    InvalidDeviation(Decimal),

    #[error("Invalid tier count: {0} (must be 1..={max})", max = crate::config::MAX_TIERS)]
    InvalidTierCount(u32),

    #[error("Insufficient balance: {asset} total {total}")]
    InsufficientBalance { asset: String, total: Decimal },

    #[error("Order too small at market precision: tier {tier} {side} price {price} amount {amount}")]
    DustOrder {
        tier: u32,
        side: String,
        price: Decimal,
        amount: Decimal,
    },

    #[error("Infeasible ladder: {asset} required {required}, available {available}")]
    InfeasibleLadder {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Decimal overflow: {0}")]
    Overflow(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl QuoteError {
    /// Whether the error stems from balances too small to fund the ladder.
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, Self::InsufficientBalance { .. } | Self::DustOrder { .. })
    }
}

pub type QuoteResult<T> = Result<T, QuoteError>;
