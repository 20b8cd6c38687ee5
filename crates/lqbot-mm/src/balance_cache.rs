//! Balance dirty-check.
//!
//! A bot only re-quotes when one of its two asset totals moved since the last
//! ladder it successfully submitted. Re-quoting on every tick would cancel and
//! replace the whole book for nothing and leave a window with no resting quotes.

use lqbot_core::BalanceSheet;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Totals of the quote and base assets observed in one balance query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub quote_asset: String,
    pub quote_total: Decimal,
    pub base_asset: String,
    pub base_total: Decimal,
}

impl BalanceSnapshot {
    /// Extract the two totals a ladder depends on from a full balance sheet.
    pub fn from_sheet(sheet: &BalanceSheet, quote: &str, base: &str) -> Self {
        Self {
            quote_asset: quote.to_string(),
            quote_total: sheet.total(quote),
            base_asset: base.to_string(),
            base_total: sheet.total(base),
        }
    }
}

/// Last-submitted totals per asset, owned by a single bot.
#[derive(Debug, Clone, Default)]
pub struct BalanceCache {
    totals: HashMap<String, Decimal>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached total for `asset`, if a ladder was ever submitted.
    pub fn get(&self, asset: &str) -> Option<Decimal> {
        self.totals.get(asset).copied()
    }

    /// Whether either total differs from the cached one.
    ///
    /// An empty cache is always dirty so the first tick quotes.
    pub fn is_dirty(&self, snapshot: &BalanceSnapshot) -> bool {
        self.get(&snapshot.quote_asset) != Some(snapshot.quote_total)
            || self.get(&snapshot.base_asset) != Some(snapshot.base_total)
    }

    /// Record the totals a ladder was just submitted for.
    ///
    /// Call only after the exchange accepted the ladder.
    pub fn commit(&mut self, snapshot: &BalanceSnapshot) {
        self.totals
            .insert(snapshot.quote_asset.clone(), snapshot.quote_total);
        self.totals
            .insert(snapshot.base_asset.clone(), snapshot.base_total);
    }

    pub fn clear(&mut self) {
        self.totals.clear();
    }
}
