//! # Proposed Values
//!
//! The oracle compares proposals with arbitrator answers by equality only,
//! so any cloneable, comparable type can be a value domain. Three domains
//! ship with the crate:
//!
//! | Type | Use | "Too early" sentinel |
//! |------|-----|----------------------|
//! | `i128` | scalar price | `i128::MIN` |
//! | [`FundingRate`] | signed 18-decimal rate | `FundingRate::TOO_EARLY` |
//! | [`MerkleRoot`] | reward-distribution root | none |
//!
//! The sentinel lets a proposer say "this event has not happened yet".
//! Event-based requests refuse it.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use optimist_core::CoreError;

/// An answer domain for the oracle.
pub trait ProposedValue: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Whether this value is the domain's "too early to answer" sentinel.
    fn is_too_early(&self) -> bool {
        false
    }
}

/// Price sentinel meaning the question cannot be answered yet.
pub const TOO_EARLY_PRICE: i128 = i128::MIN;

impl ProposedValue for i128 {
    fn is_too_early(&self) -> bool {
        *self == TOO_EARLY_PRICE
    }
}

// ── FundingRate ────────────────────────────────────────────────────────

/// A signed funding rate with 18 decimals (`1e18` = 100% per period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FundingRate(i128);

impl FundingRate {
    /// Decimal places.
    pub const DECIMALS: u32 = 18;
    /// Sentinel for "too early".
    pub const TOO_EARLY: FundingRate = FundingRate(i128::MIN);

    /// From the raw scaled value.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// The raw scaled value.
    pub const fn raw(&self) -> i128 {
        self.0
    }
}

impl ProposedValue for FundingRate {
    fn is_too_early(&self) -> bool {
        *self == Self::TOO_EARLY
    }
}

impl std::fmt::Display for FundingRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scale = 10u128.pow(Self::DECIMALS);
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let int = abs / scale;
        let frac = abs % scale;
        if frac == 0 {
            return write!(f, "{sign}{int}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{sign}{int}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for FundingRate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidAmount {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let magnitude: optimist_core::FixedPoint = digits
            .parse()
            .map_err(|_| invalid("expected a signed decimal rate"))?;
        // The negative range reaches one further than the positive one, so
        // `TOO_EARLY` only parses with its sign applied to the magnitude.
        let raw = if negative {
            0i128.checked_sub_unsigned(magnitude.raw())
        } else {
            i128::try_from(magnitude.raw()).ok()
        };
        raw.map(Self).ok_or_else(|| invalid("rate out of range"))
    }
}

impl Serialize for FundingRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FundingRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── MerkleRoot ─────────────────────────────────────────────────────────

/// A 32-byte Merkle root proposed for a reward distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MerkleRoot([u8; 32]);

impl MerkleRoot {
    /// From raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl ProposedValue for MerkleRoot {}

impl std::fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for MerkleRoot {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidAmount {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != 64 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("expected 64 hex digits"));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[2 * i..2 * i + 2], 16)
                .map_err(|_| invalid("non-hex character"))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for MerkleRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MerkleRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
