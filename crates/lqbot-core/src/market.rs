//! Market and asset metadata.
//!
//! Markets are named `{BASE}_{QUOTE}` (e.g. "ETH_USDT"). Metadata is loaded
//! once per session from the exchange and treated as immutable afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Build the canonical market name from base and quote symbols.
pub fn market_name(base: &str, quote: &str) -> String {
    format!("{base}_{quote}")
}

/// Market definition from the exchange market list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Market name (e.g. "ETH_USDT").
    pub name: String,
    /// Base asset symbol.
    pub base: String,
    /// Quote asset symbol.
    pub quote: String,
    /// Decimal places allowed in prices.
    pub price_precision: i32,
    /// Decimal places allowed in amounts.
    pub amount_precision: i32,
    /// Minimum order amount in base units.
    #[serde(default)]
    pub min_amount: Decimal,
}

impl MarketInfo {
    /// Check that the name matches `{base}_{quote}` and precisions are non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.name != market_name(&self.base, &self.quote) {
            return Err(CoreError::InvalidMarketName(self.name.clone()));
        }
        if self.price_precision < 0 {
            return Err(CoreError::InvalidPrecision(self.price_precision));
        }
        if self.amount_precision < 0 {
            return Err(CoreError::InvalidPrecision(self.amount_precision));
        }
        Ok(())
    }

    /// Whether price or amount precision differs from `other`.
    pub fn has_material_change(&self, other: &MarketInfo) -> bool {
        self.price_precision != other.price_precision
            || self.amount_precision != other.amount_precision
            || self.base != other.base
            || self.quote != other.quote
    }
}

/// Asset metadata from the exchange asset list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Asset symbol (e.g. "ETH").
    pub symbol: String,
    /// Decimal places the exchange keeps for balances of this asset.
    #[serde(default)]
    pub prec_save: u32,
    /// Decimal places shown to users.
    #[serde(default)]
    pub prec_show: u32,
}
