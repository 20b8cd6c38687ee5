//! Account balances.
//!
//! The exchange reports each asset as an `available` leg plus a `frozen` leg
//! (locked by resting orders). Their sum is the total holding. Negative legs
//! can appear transiently for margin-style assets and are kept as reported.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Balance of one asset for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub available: Decimal,
    pub frozen: Decimal,
}

impl Balance {
    pub const ZERO: Self = Self {
        available: Decimal::ZERO,
        frozen: Decimal::ZERO,
    };

    pub fn new(available: Decimal, frozen: Decimal) -> Self {
        Self { available, frozen }
    }

    /// Total economic holding: available + frozen.
    #[inline]
    pub fn total(&self) -> Decimal {
        self.available + self.frozen
    }
}

/// All balances of one user, keyed by asset symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet(HashMap<String, Balance>);

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: impl Into<String>, balance: Balance) {
        self.0.insert(asset.into(), balance);
    }

    /// Balance for `asset`, if the exchange reported it.
    pub fn get(&self, asset: &str) -> Option<&Balance> {
        self.0.get(asset)
    }

    /// Total holding for `asset`. Unreported assets count as zero.
    pub fn total(&self, asset: &str) -> Decimal {
        self.0.get(asset).map(Balance::total).unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Balance)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Balance)> for BalanceSheet {
    fn from_iter<I: IntoIterator<Item = (String, Balance)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_sums_legs() {
        let balance = Balance::new(dec!(1.5), dec!(0.25));
        assert_eq!(balance.total(), dec!(1.75));
    }

    #[test]
    fn test_negative_legs_preserved() {
        let balance = Balance::new(dec!(-2), dec!(0.5));
        assert_eq!(balance.total(), dec!(-1.5));
    }

    #[test]
    fn test_missing_asset_counts_as_zero() {
        let mut sheet = BalanceSheet::new();
        sheet.insert("BTC", Balance::new(dec!(1), dec!(0)));

        assert_eq!(sheet.total("BTC"), dec!(1));
        assert_eq!(sheet.total("DIF"), Decimal::ZERO);
        assert!(sheet.get("DIF").is_none());
    }

    #[test]
    fn test_deserialize_from_map() {
        let json = r#"{"ETH": {"available": "1.5", "frozen": "0.5"}}"#;
        let sheet: BalanceSheet = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.total("ETH"), dec!(2));
    }
}
