//! # Money Module
//!
//! Provides the `Money` type for every amount that crosses the cash register:
//! opening floats, counted buckets, sales totals and variances.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Closing a shift adds five counted buckets and subtracts the system    │
//! │  total. In floating point:                                              │
//! │    480.10 + 50.20 - 530.30 = -0.00000000000005  ❌ "S/ -0.00" variance  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents (céntimos)                                 │
//! │    48010 + 5020 - 53030 = 0                     ✅ balanced             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Where Floats Still Appear
//! The backend speaks JSON numbers (`"montoInicial": 200.5`). The [`decimal`]
//! and [`decimal_opt`] serde modules convert at the wire boundary, rounding to
//! the nearest cent, so nothing past the protocol layer ever sees an `f64`.
//!
//! ## Usage
//! ```rust
//! use caja_core::money::Money;
//!
//! let float = Money::from_major_minor(200, 0);   // S/ 200.00
//! let sales = Money::from_cents(30_050);         // S/ 300.50
//! assert_eq!((float + sales).cents(), 50_050);
//!
//! // Operator input: numeric text, empty or garbage counts as zero
//! assert_eq!(Money::parse_input("150,5").cents(), 15_050);
//! assert_eq!(Money::parse_input("abc").cents(), 0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in céntimos (1/100 of a sol).
///
/// ## Design Decisions
/// - **i64 (signed)**: variances and expenses can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Saturating operators**: wire amounts are unbounded, sums never wrap
/// - **Serde as cents**: internal JSON (view-models, TS bindings) carries
///   cents; the REST wire format goes through [`decimal`] instead
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from soles and céntimos.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    ///
    /// ```rust
    /// use caja_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole soles portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the céntimos portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Largest amount accepted from text: one trillion soles.
    ///
    /// Five buckets at this cap still add up far below `i64::MAX` cents.
    pub const MAX_PARSED: Money = Money(100_000_000_000_000);

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Parses numeric text into money.
    ///
    /// ## Accepted Input
    /// ```text
    /// "150"      → 150.00        "-12.5"    → -12.50
    /// "150.5"    → 150.50        " 80 "     → 80.00
    /// "150,50"   → 150.50        "1,234.56" → 1234.56
    /// ".75"      → 0.75          "10.005"   → 10.01 (half up)
    /// ```
    ///
    /// Magnitudes above [`Money::MAX_PARSED`] are rejected as too large.
    ///
    /// A lone comma is read as the decimal separator (Peruvian keyboards);
    /// when both separators appear the comma groups thousands.
    pub fn parse(text: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed).trim_start()),
        };

        let normalized = if unsigned.contains('.') {
            unsigned.replace(',', "")
        } else {
            unsigned.replace(',', ".")
        };

        let mut parts = normalized.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next().unwrap_or_default();

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a number"));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };

        let digits: Vec<i64> = fraction
            .chars()
            .filter_map(|c| c.to_digit(10).map(i64::from))
            .collect();
        let mut minor = digits.first().copied().unwrap_or(0) * 10 + digits.get(1).copied().unwrap_or(0);
        if digits.get(2).copied().unwrap_or(0) >= 5 {
            minor += 1;
        }

        let cents = whole_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .filter(|c| *c <= Money::MAX_PARSED.0)
            .ok_or_else(|| invalid("too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Parses operator input, coercing empty or non-numeric text to zero.
    ///
    /// Used for live totals while a form is being typed: the field keeps
    /// whatever the operator wrote, the arithmetic treats it as `0`.
    pub fn parse_input(text: &str) -> Money {
        Money::parse(text).unwrap_or_default()
    }

    /// Converts a JSON number to money, rounding to the nearest cent.
    ///
    /// Goes through the shortest decimal representation of the float so that
    /// `1.005` rounds like the text the server wrote, not like `1.00499…`.
    pub fn from_wire_number(value: f64) -> Money {
        if !value.is_finite() {
            return Money::zero();
        }
        Money::parse(&value.to_string()).unwrap_or_else(|_| Money((value * 100.0).round() as i64))
    }

    /// Returns the amount as a JSON-friendly float with two decimals.
    pub fn to_wire_number(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal form (`"1234.50"`, `"-5.00"`), as typed into form fields.
///
/// Use [`crate::format::currency`] for operator-facing display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Wire Serde Helpers
// =============================================================================

/// Serde adapter for amounts the backend sends as decimal numbers.
///
/// Accepts a JSON number or a numeric string (`"150.00"`), serializes as a
/// number with at most two decimals.
///
/// ```rust
/// use caja_core::money::{self, Money};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Body {
///     #[serde(with = "money::decimal")]
///     monto: Money,
/// }
///
/// let body: Body = serde_json::from_str(r#"{"monto": "150.5"}"#).unwrap();
/// assert_eq!(body.monto.cents(), 15_050);
/// ```
pub mod decimal {
    use super::Money;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_wire_number())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    pub(super) struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an amount as a number or numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            v.checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| E::custom("amount out of range"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            i64::try_from(v)
                .map_err(|_| E::custom("amount out of range"))
                .and_then(|v| self.visit_i64(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            Ok(Money::from_wire_number(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse(v).map_err(E::custom)
        }
    }
}

/// Like [`decimal`] for optional amounts; `null` and missing fields map to `None`.
///
/// Fields using it need `#[serde(default)]` to tolerate absence.
pub mod decimal_opt {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(money) => serializer.serialize_some(&money.to_wire_number()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::decimal")] Money);

        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(money)| money))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
