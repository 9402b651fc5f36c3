//! # Money Module
//!
//! Provides the `Money` and `Percentage` value types.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUNDING POLICY                                                        │
//! │                                                                         │
//! │  price 19.99, discount 15%, qty 3                                       │
//! │    line total  = (19.99 - 19.99 × 0.15) × 3 = 50.9745   (kept as-is)    │
//! │    subtotal    = Σ line totals                          (kept as-is)    │
//! │    stored      = subtotal / discount / tax / total      (kept as-is)    │
//! │    displayed   = "$50.97"                    ◄── ONLY place we round    │
//! │                                                                         │
//! │  Rounding per line and then summing drifts from the stored total by a  │
//! │  cent here and there, so amounts stay unrounded until presentation.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockly_core::money::{Money, Percentage};
//!
//! let price = Money::new(29.99);
//! let discounted = price.apply_discount(Percentage::sanitize(10.0));
//! assert_eq!(discounted.to_string(), "$26.99");
//!
//! // Non-numeric input never reaches the arithmetic
//! assert!(Percentage::sanitize(f64::NAN).is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A currency amount in major units (e.g. dollars).
///
/// ## Design Decisions
/// - **f64**: line totals carry fractional cents until presentation
/// - **Single field tuple struct**: zero-cost wrapper, serialises as a number
/// - **No Eq/Ord**: floating point; compare with a tolerance in tests
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(f64);

impl Money {
    /// Creates a Money value from an amount in major units.
    ///
    /// ## Example
    /// ```rust
    /// use stockly_core::money::Money;
    ///
    /// let price = Money::new(10.99);
    /// assert_eq!(price.amount(), 10.99);
    /// ```
    #[inline]
    pub const fn new(amount: f64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in major units.
    #[inline]
    pub const fn amount(&self) -> f64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0.0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns the amount rounded to whole cents, as cents.
    ///
    /// ## Example
    /// ```rust
    /// use stockly_core::money::Money;
    ///
    /// assert_eq!(Money::new(50.9745).cents(), 5097);
    /// assert_eq!(Money::new(0.005).cents(), 1);
    /// ```
    #[inline]
    pub fn cents(&self) -> i64 {
        (self.0 * 100.0).round() as i64
    }

    /// Rounds to 2 decimal places. Presentation only.
    pub fn round_to_cents(&self) -> Money {
        Money((self.0 * 100.0).round() / 100.0)
    }

    /// Returns `pct` percent of this amount: `amount * pct / 100`.
    ///
    /// ## Example
    /// ```rust
    /// use stockly_core::money::{Money, Percentage};
    ///
    /// let tax = Money::new(171.0).percent_of(Percentage::sanitize(8.0));
    /// assert!((tax.amount() - 13.68).abs() < 1e-9);
    /// ```
    #[inline]
    pub fn percent_of(&self, pct: Percentage) -> Money {
        Money(self.0 * pct.value() / 100.0)
    }

    /// Returns the amount left after taking `pct` percent off.
    ///
    /// ## Example
    /// ```rust
    /// use stockly_core::money::{Money, Percentage};
    ///
    /// let unit = Money::new(100.0).apply_discount(Percentage::sanitize(10.0));
    /// assert_eq!(unit.amount(), 90.0);
    /// ```
    #[inline]
    pub fn apply_discount(&self, pct: Percentage) -> Money {
        *self - self.percent_of(pct)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to cents: `$10.99`, `-$5.50`.
///
/// ## Note
/// Locale-aware formatting (symbol, decimals) lives in the server config.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.abs();
        write!(f, "{}${}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty as f64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in the closed range 0–100 (`8.0` = 8%).
///
/// The only way to build one is [`Percentage::sanitize`], so a `Percentage`
/// is always finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Percentage(f64);

impl Percentage {
    /// Turns a raw percentage input into a usable one.
    ///
    /// ## Rules
    /// - NaN / ±infinity → 0 (a blank or garbled form field means "none")
    /// - below 0 → 0, above 100 → 100
    ///
    /// ## Example
    /// ```rust
    /// use stockly_core::money::Percentage;
    ///
    /// assert_eq!(Percentage::sanitize(8.25).value(), 8.25);
    /// assert_eq!(Percentage::sanitize(f64::NAN).value(), 0.0);
    /// assert_eq!(Percentage::sanitize(150.0).value(), 100.0);
    /// assert_eq!(Percentage::sanitize(-3.0).value(), 0.0);
    /// ```
    pub fn sanitize(raw: f64) -> Self {
        if !raw.is_finite() {
            return Percentage::zero();
        }
        Percentage(raw.clamp(0.0, 100.0))
    }

    /// Like [`Percentage::sanitize`], treating a missing value as 0.
    pub fn from_input(raw: Option<f64>) -> Self {
        raw.map(Percentage::sanitize).unwrap_or_default()
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0.0)
    }

    /// Returns the percentage value (0–100).
    #[inline]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl From<f64> for Percentage {
    fn from(raw: f64) -> Self {
        Percentage::sanitize(raw)
    }
}

/// Deserialising goes through `sanitize` too.
impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(Percentage::sanitize)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::new(10.99)), "$10.99");
        assert_eq!(format!("{}", Money::new(5.0)), "$5.00");
        assert_eq!(format!("{}", Money::new(-5.5)), "-$5.50");
        assert_eq!(format!("{}", Money::new(0.0)), "$0.00");
        assert_eq!(format!("{}", Money::new(184.68)), "$184.68");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(10.0);
        let b = Money::new(5.0);

        assert_eq!((a + b).amount(), 15.0);
        assert_eq!((a - b).amount(), 5.0);
        assert_eq!((a * 3).amount(), 30.0);

        let mut c = a;
        c += b;
        c -= Money::new(1.0);
        assert_eq!(c.amount(), 14.0);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::new(1.5), Money::new(2.5), Money::new(6.0)];
        let by_ref: Money = amounts.iter().sum();
        let by_value: Money = amounts.into_iter().sum();
        assert_eq!(by_ref.amount(), 10.0);
        assert_eq!(by_value.amount(), 10.0);

        let empty: Vec<Money> = Vec::new();
        assert!(empty.into_iter().sum::<Money>().is_zero());
    }

    #[test]
    fn test_round_to_cents_is_presentation_only() {
        let line = Money::new(19.99).apply_discount(Percentage::sanitize(15.0)) * 3;
        assert!((line.amount() - 50.9745).abs() < 1e-9);
        assert_eq!(line.round_to_cents().amount(), 50.97);
        assert_eq!(line.cents(), 5097);
    }

    #[test]
    fn test_percent_of_and_discount() {
        let subtotal = Money::new(180.0);
        assert!((subtotal.percent_of(Percentage::sanitize(5.0)).amount() - 9.0).abs() < 1e-9);
        assert!((subtotal.apply_discount(Percentage::sanitize(5.0)).amount() - 171.0).abs() < 1e-9);
        assert_eq!(subtotal.apply_discount(Percentage::zero()), subtotal);
        assert!(subtotal.apply_discount(Percentage::sanitize(100.0)).is_zero());
    }

    #[test]
    fn test_sanitize_non_finite() {
        assert!(Percentage::sanitize(f64::NAN).is_zero());
        assert!(Percentage::sanitize(f64::INFINITY).is_zero());
        assert!(Percentage::sanitize(f64::NEG_INFINITY).is_zero());
        assert!(Percentage::from_input(None).is_zero());
        assert_eq!(Percentage::from_input(Some(12.5)).value(), 12.5);
    }

    #[test]
    fn test_percentage_deserialize_is_sanitized() {
        let pct: Percentage = serde_json::from_str("250").unwrap();
        assert_eq!(pct.value(), 100.0);

        let money: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(money.amount(), 12.5);
        assert_eq!(serde_json::to_string(&money).unwrap(), "12.5");
    }
}
