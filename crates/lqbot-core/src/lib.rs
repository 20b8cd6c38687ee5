//! Core domain types for the liquidity bot harness.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Price`, `Size`: precision-safe numeric types
//! - `round_to_precision`: side-aware decimal rounding
//! - `OrderSpec`, `OrderSide`, `OrderType`: order construction
//! - `MarketInfo`, `AssetInfo`: exchange metadata
//! - `Balance`, `BalanceSheet`: per-asset account balances

pub mod balance;
pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use balance::{Balance, BalanceSheet};
pub use decimal::{round_to_precision, Price, RoundingMode, Size};
pub use error::{CoreError, Result};
pub use market::{market_name, AssetInfo, MarketInfo};
pub use order::{OrderSide, OrderSpec, OrderType};
