//! # Ancillary Data
//!
//! Free-form bytes that qualify a request (a question text, a market id).
//! Before a question reaches the arbitrator the requester address is
//! appended, so two requesters asking the same question never collide:
//!
//! ```text
//! q:title:Will it rain?,ooRequester:00000000000000000000000000000000000000ab
//! ```
//!
//! Empty data is stamped without the leading comma.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::Address;

/// Hard cap on stamped ancillary data, in bytes.
pub const MAX_STAMPED_ANCILLARY_LEN: usize = 8192;

const REQUESTER_TAG: &[u8] = b"ooRequester:";

/// An opaque ancillary-data blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AncillaryData(Vec<u8>);

impl AncillaryData {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// No ancillary data.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of `self` once stamped with a requester.
    pub fn stamped_len(&self) -> usize {
        let sep = usize::from(!self.0.is_empty());
        self.0.len() + sep + REQUESTER_TAG.len() + 40
    }

    /// Append `ooRequester:<hex>` (comma-separated unless empty).
    pub fn stamp_requester(&self, requester: &Address) -> AncillaryData {
        let mut out = Vec::with_capacity(self.stamped_len());
        out.extend_from_slice(&self.0);
        if !self.0.is_empty() {
            out.push(b',');
        }
        out.extend_from_slice(REQUESTER_TAG);
        out.extend_from_slice(requester.to_hex().as_bytes());
        AncillaryData(out)
    }

    /// Lossy UTF-8 view for logs and reports.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Lowercase hex of the raw bytes.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl From<&str> for AncillaryData {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Serialized as a hex string so canonical request keys are text-only.
impl Serialize for AncillaryData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AncillaryData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hex(&s)
            .map(AncillaryData)
            .ok_or_else(|| serde::de::Error::custom("ancillary data must be even-length hex"))
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    let raw = s.as_bytes();
    if raw.len() % 2 != 0 {
        return None;
    }
    raw.chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            u8::try_from(hi * 16 + lo).ok()
        })
        .collect()
}
