//! # Identity Newtypes
//!
//! Validated wrappers for the names that appear in request keys and ledger
//! entries: account [`Address`], reward [`Currency`] and topic
//! [`Identifier`]. All three serialize as strings so they canonicalize
//! without ambiguity.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ── Address ────────────────────────────────────────────────────────────

/// A 20-byte account address, rendered as `0x` followed by 40 lowercase
/// hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The null address. Never a valid beneficiary or fee sink.
    pub const ZERO: Address = Address([0u8; 20]);

    /// From raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// An address whose last byte is `n` and all others zero. Handy for
    /// readable fixtures.
    pub const fn from_low_u64(n: u64) -> Self {
        let be = n.to_be_bytes();
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The 40 lowercase hex digits, without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse `0x`-prefixed or bare 40-digit hex. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(CoreError::InvalidAddress {
                input: s.to_string(),
                reason: format!("expected 40 hex digits, got {}", digits.len()),
            });
        }
        let mut bytes = [0u8; 20];
        let raw = digits.as_bytes();
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_value(raw[2 * i]);
            let lo = hex_value(raw[2 * i + 1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => *byte = (hi << 4) | lo,
                _ => {
                    return Err(CoreError::InvalidAddress {
                        input: s.to_string(),
                        reason: "non-hex character".to_string(),
                    })
                }
            }
        }
        Ok(Self(bytes))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ── Currency ───────────────────────────────────────────────────────────

/// A reward/bond currency code, e.g. `USDC`. One to 16 ASCII
/// alphanumerics, `-` or `_`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Maximum code length.
    pub const MAX_LEN: usize = 16;

    /// Validate and wrap a currency code.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        if code.is_empty() || code.len() > Self::MAX_LEN {
            return Err(CoreError::InvalidCurrency {
                reason: format!("length must be 1..={}", Self::MAX_LEN),
                input: code,
            });
        }
        if !code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(CoreError::InvalidCurrency {
                input: code,
                reason: "only ASCII alphanumerics, '-' and '_' are allowed".to_string(),
            });
        }
        Ok(Self(code))
    }

    /// The currency code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// ── Identifier ─────────────────────────────────────────────────────────

/// A request topic such as `YES_OR_NO_QUERY`. Non-empty, at most 32 bytes,
/// no control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Maximum encoded length in bytes.
    pub const MAX_LEN: usize = 32;

    /// Validate and wrap a topic name.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                input: name,
                reason: "must not be empty".to_string(),
            });
        }
        if name.len() > Self::MAX_LEN {
            return Err(CoreError::InvalidIdentifier {
                reason: format!("{} bytes exceeds {}", name.len(), Self::MAX_LEN),
                input: name,
            });
        }
        if name.chars().any(char::is_control) {
            return Err(CoreError::InvalidIdentifier {
                input: name,
                reason: "control characters are not allowed".to_string(),
            });
        }
        Ok(Self(name))
    }

    /// The topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
