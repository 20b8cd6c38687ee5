//! Tiered market-making quote engine.
//!
//! Provides the pieces a liquidity bot runs on every tick:
//! - Balance dirty-check against the totals seen at the last submission
//! - Geometric quote ladder around the balance-implied mid price
//! - Ladder feasibility check against the balances that fund it
//!
//! # Architecture
//!
//! ```text
//! Balance query → BalanceSnapshot
//!                  ├─ BalanceCache::is_dirty(): skip if nothing traded
//!                  └─ generate_ladder(): [ask0, bid0, ask1, bid1, ...]
//!                       ↓
//!                  Gateway batch replace (reset = true)
//!                       ↓
//!                  BalanceCache::commit() on success
//! ```

pub mod balance_cache;
pub mod config;
pub mod error;
pub mod ladder;

pub use balance_cache::{BalanceCache, BalanceSnapshot};
pub use config::{LadderConfig, MAX_TIERS};
pub use error::{QuoteError, QuoteResult};
pub use ladder::{compute_tiers, generate_ladder, LadderTier};
