//! Liquidity ladder configuration.

use lqbot_core::market_name;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};

/// Configuration of one liquidity bot.
///
/// Supplied once at bot construction and immutable for the bot's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Base asset symbol (e.g. "ETH").
    pub base: String,

    /// Quote asset symbol (e.g. "USDT").
    pub quote: String,

    /// Geometric spacing factor between consecutive tiers.
    /// 1.002 = 0.2% between tiers.
    #[serde(default = "default_deviation")]
    pub deviation: Decimal,

    /// Number of tiers per side.
    #[serde(default = "default_tiers_amount")]
    pub tiers_amount: u32,

    /// User whose balances fund the ladder and whose orders are replaced.
    pub user_id: String,

    /// Taker fee attached to every order.
    #[serde(default)]
    pub taker_fee: Decimal,

    /// Maker fee attached to every order.
    #[serde(default)]
    pub maker_fee: Decimal,
}

/// Upper bound on tiers per side.
pub const MAX_TIERS: u32 = 1000;

fn default_deviation() -> Decimal {
    Decimal::new(1002, 3) // 1.002
}

fn default_tiers_amount() -> u32 {
    20
}

impl LadderConfig {
    /// Create a config with default deviation, tier count and zero fees.
    pub fn new(
        base: impl Into<String>,
        quote: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            deviation: default_deviation(),
            tiers_amount: default_tiers_amount(),
            user_id: user_id.into(),
            taker_fee: Decimal::ZERO,
            maker_fee: Decimal::ZERO,
        }
    }

    /// Market name this ladder quotes, `{base}_{quote}`.
    pub fn market(&self) -> String {
        market_name(&self.base, &self.quote)
    }

    /// Reject parameters that would produce a degenerate ladder.
    pub fn validate(&self) -> QuoteResult<()> {
        if self.deviation <= Decimal::ONE {
            return Err(QuoteError::InvalidDeviation(self.deviation));
        }
        if self.tiers_amount == 0 || self.tiers_amount > MAX_TIERS {
            return Err(QuoteError::InvalidTierCount(self.tiers_amount));
        }
        if self.base.is_empty() || self.quote.is_empty() {
            return Err(QuoteError::InvalidConfig(
                "base and quote must be non-empty".to_string(),
            ));
        }
        if self.base == self.quote {
            return Err(QuoteError::InvalidConfig(format!(
                "base and quote are both {}",
                self.base
            )));
        }
        if self.user_id.is_empty() {
            return Err(QuoteError::InvalidConfig("user_id must be set".to_string()));
        }
        Ok(())
    }
}
