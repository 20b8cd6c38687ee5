//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Rounded prices and amounts
//! are compared for exact equality downstream, so nothing here ever goes
//! through a binary float.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::order::OrderSide;

/// Direction used when cutting a value down to a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    /// Ceiling (toward +inf).
    Up,
    /// Floor (toward -inf).
    Down,
    /// Nearest, midpoint away from zero.
    Nearest,
}

impl RoundingMode {
    /// Rounding policy for an order side.
    ///
    /// Asks round up, bids round down, and side-less values round to nearest.
    pub fn for_side(side: Option<OrderSide>) -> Self {
        match side {
            Some(OrderSide::Ask) => Self::Up,
            Some(OrderSide::Bid) => Self::Down,
            None => Self::Nearest,
        }
    }

    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Up => RoundingStrategy::ToPositiveInfinity,
            Self::Down => RoundingStrategy::ToNegativeInfinity,
            Self::Nearest => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Round `value` to `precision` decimal places.
///
/// `precision = 0` rounds to an integer. Negative precision is rejected with
/// `CoreError::InvalidPrecision`. Values that already have `precision` or
/// fewer decimals are returned unchanged, so rounding is idempotent.
pub fn round_to_precision(value: Decimal, mode: RoundingMode, precision: i32) -> Result<Decimal> {
    if precision < 0 {
        return Err(CoreError::InvalidPrecision(precision));
    }
    Ok(value.round_dp_with_strategy(precision as u32, mode.strategy()))
}

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with sizes in calculations. Serializes as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to `precision` decimals using the side's rounding policy.
    #[inline]
    pub fn round_for_side(&self, side: Option<OrderSide>, precision: i32) -> Result<Self> {
        round_to_precision(self.0, RoundingMode::for_side(side), precision).map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Size/quantity with exact decimal precision.
///
/// Order amounts are always expressed in units of the market's base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to `precision` decimals using the side's rounding policy.
    #[inline]
    pub fn round_for_side(&self, side: Option<OrderSide>, precision: i32) -> Result<Self> {
        round_to_precision(self.0, RoundingMode::for_side(side), precision).map(Self)
    }

    /// Calculate notional value: size * price (in quote units).
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Size {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}
