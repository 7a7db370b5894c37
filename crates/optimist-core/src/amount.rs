//! # Amounts and Fixed-Point Math
//!
//! [`Amount`] is an unsigned integer quantity of a currency's smallest unit.
//! [`FixedPoint`] is an unsigned 18-decimal ratio used for the default bond
//! percentage. Both serialize as decimal strings: `u128` does not fit a JSON
//! number, and canonical bytes reject floats.
//!
//! Every arithmetic helper is checked and returns [`CoreError::Overflow`]
//! instead of wrapping.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ── Amount ─────────────────────────────────────────────────────────────

/// A non-negative quantity in a currency's base unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(0);
    /// Largest representable amount.
    pub const MAX: Amount = Amount(u128::MAX);

    /// Wrap a raw base-unit quantity.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw base-unit quantity.
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self + rhs`.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, CoreError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or_else(|| overflow("amount add"))
    }

    /// `self - rhs`.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, CoreError> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount)
            .ok_or_else(|| overflow("amount sub"))
    }

    /// Floor of `self / 2`.
    pub const fn half_floor(self) -> Amount {
        Amount(self.0 / 2)
    }

    /// Ceiling of `self / 2`; `half_floor + half_ceil == self` always.
    pub const fn half_ceil(self) -> Amount {
        Amount(self.0 - self.0 / 2)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(iter: I) -> Result<Amount, CoreError> {
        iter.into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

fn overflow(operation: &str) -> CoreError {
    CoreError::Overflow {
        operation: operation.to_string(),
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl From<u64> for Amount {
    fn from(raw: u64) -> Self {
        Self(u128::from(raw))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidAmount {
                input: s.to_string(),
                reason: "expected an unsigned decimal integer".to_string(),
            });
        }
        trimmed
            .parse::<u128>()
            .map(Amount)
            .map_err(|e| CoreError::InvalidAmount {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts both `"123"` and `123`; YAML configs commonly write small fees
/// as bare integers.
struct AmountVisitor;

impl serde::de::Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("an unsigned integer or a decimal string")
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
        u64::try_from(v)
            .map(Amount::from)
            .map_err(|_| E::custom(format!("amount must be non-negative, got {v}")))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }
}

// ── FixedPoint ─────────────────────────────────────────────────────────

/// An unsigned ratio with 18 decimal places. `FixedPoint::ONE` is `1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(u128);

impl FixedPoint {
    /// Number of decimal places.
    pub const DECIMALS: u32 = 18;
    /// Scaling factor, `10^18`.
    pub const SCALE: u128 = 1_000_000_000_000_000_000;
    /// `0.0`.
    pub const ZERO: FixedPoint = FixedPoint(0);
    /// `1.0`.
    pub const ONE: FixedPoint = FixedPoint(Self::SCALE);

    /// From the raw scaled representation (`raw / 10^18`).
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw scaled representation.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// From a whole number.
    pub fn from_integer(n: u64) -> Self {
        Self(u128::from(n) * Self::SCALE)
    }

    /// `floor(amount * self)`.
    ///
    /// Computed as `q * self + floor(r * self / SCALE)` with
    /// `amount = q * SCALE + r`, so intermediates stay within `u128` for any
    /// result that itself fits.
    pub fn mul_amount_floor(&self, amount: Amount) -> Result<Amount, CoreError> {
        let a = amount.get();
        let q = a / Self::SCALE;
        let r = a % Self::SCALE;
        let whole = q
            .checked_mul(self.0)
            .ok_or_else(|| overflow("fixed-point multiply"))?;
        let frac = mul_div_floor(r, self.0, Self::SCALE)?;
        whole
            .checked_add(frac)
            .map(Amount)
            .ok_or_else(|| overflow("fixed-point multiply"))
    }
}

/// `floor(a * b / d)` for `a < d`, splitting `b` so the product never
/// exceeds `u128`.
fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128, CoreError> {
    let bq = b / d;
    let br = b % d;
    let hi = a
        .checked_mul(bq)
        .ok_or_else(|| overflow("fixed-point multiply"))?;
    // a < d and br < d, with d = 10^18, so a * br < 10^36 < u128::MAX.
    let lo = a * br / d;
    hi.checked_add(lo)
        .ok_or_else(|| overflow("fixed-point multiply"))
}

impl std::fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let int = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            return write!(f, "{int}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for FixedPoint {
    type Err = CoreError;

    /// Parse `"1"`, `"0.5"`, `"2.000000000000000001"`. At most 18 fractional
    /// digits; no sign, no exponent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidAmount {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = s.trim();
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected an unsigned decimal number"));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected an unsigned decimal number"));
        }
        if frac_part.len() > Self::DECIMALS as usize {
            return Err(invalid("more than 18 fractional digits"));
        }
        if trimmed.ends_with('.') {
            return Err(invalid("trailing decimal point"));
        }
        let int: u128 = int_part.parse().map_err(|_| invalid("integer part too large"))?;
        let mut frac: u128 = 0;
        if !frac_part.is_empty() {
            frac = frac_part.parse().map_err(|_| invalid("bad fraction"))?;
            frac *= 10u128.pow(Self::DECIMALS - frac_part.len() as u32);
        }
        int.checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(frac))
            .map(FixedPoint)
            .ok_or_else(|| invalid("value too large"))
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FixedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FixedPointVisitor)
    }
}

struct FixedPointVisitor;

impl serde::de::Visitor<'_> for FixedPointVisitor {
    type Value = FixedPoint;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a non-negative decimal string such as \"0.5\"")
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<FixedPoint, E> {
        Ok(FixedPoint::from_integer(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<FixedPoint, E> {
        u64::try_from(v)
            .map(FixedPoint::from_integer)
            .map_err(|_| E::custom(format!("ratio must be non-negative, got {v}")))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<FixedPoint, E> {
        v.parse().map_err(E::custom)
    }
}
