//! Order-related types.
//!
//! Provides order side, order type and the `OrderSpec` submitted to the
//! exchange in batch-replace requests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Price, Size};
use crate::error::Result;
use crate::market::MarketInfo;

/// Order side: ask (sell base) or bid (buy base).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Ask,
    Bid,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Ask => Self::Bid,
            Self::Bid => Self::Ask,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask => write!(f, "ASK"),
            Self::Bid => write!(f, "BID"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Limit order.
    Limit,
    /// Market order.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
            Self::Market => write!(f, "MARKET"),
        }
    }
}

/// A single order as submitted to the exchange.
///
/// Built fresh for every submission and never mutated afterwards. Price and
/// amount are already rounded to the market's precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Market name (e.g. "ETH_USDT").
    pub market: String,
    #[serde(rename = "order_side")]
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Price,
    /// Amount in base asset units.
    pub amount: Size,
    pub taker_fee: Decimal,
    pub maker_fee: Decimal,
}

impl OrderSpec {
    /// Build a limit order, rounding price and amount for `side` at the
    /// market's precision.
    pub fn limit(
        market: &MarketInfo,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
        taker_fee: Decimal,
        maker_fee: Decimal,
    ) -> Result<Self> {
        let price = Price::new(price).round_for_side(Some(side), market.price_precision)?;
        let amount = Size::new(amount).round_for_side(Some(side), market.amount_precision)?;

        Ok(Self {
            market: market.name.clone(),
            side,
            order_type: OrderType::Limit,
            price,
            amount,
            taker_fee,
            maker_fee,
        })
    }

    /// Quote-asset value locked by this order.
    pub fn notional(&self) -> Decimal {
        self.amount.notional(self.price)
    }
}
