//! # Request Keys
//!
//! A [`RequestKey`] is the `(requester, identifier, timestamp, ancillary
//! data)` tuple that names a request. Two keys with the same four parts are
//! the same logical request. [`RequestId`] is its SHA-256 over canonical
//! JSON, used as the store index and in every log line.

use serde::{Deserialize, Serialize};

use crate::ancillary::AncillaryData;
use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::CoreError;
use crate::identity::{Address, Identifier};
use crate::temporal::Timestamp;

/// The immutable composite key of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    /// Account that opened the request.
    pub requester: Address,
    /// Topic of the question.
    pub identifier: Identifier,
    /// The instant the question refers to.
    pub timestamp: Timestamp,
    /// Caller-supplied qualifier, unstamped.
    pub ancillary_data: AncillaryData,
}

impl RequestKey {
    /// Assemble a key.
    pub fn new(
        requester: Address,
        identifier: Identifier,
        timestamp: Timestamp,
        ancillary_data: AncillaryData,
    ) -> Self {
        Self {
            requester,
            identifier,
            timestamp,
            ancillary_data,
        }
    }

    /// Content-addressed id of this key.
    pub fn id(&self) -> Result<RequestId, CoreError> {
        let canonical = CanonicalBytes::new(self)?;
        Ok(RequestId(sha256_digest(&canonical)))
    }

    /// Ancillary data with the requester stamp appended.
    pub fn stamped_ancillary_data(&self) -> AncillaryData {
        self.ancillary_data.stamp_requester(&self.requester)
    }
}

/// Digest of a canonical [`RequestKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(ContentDigest);

impl RequestId {
    /// The underlying digest.
    pub fn digest(&self) -> &ContentDigest {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request:{}", self.0.short_hex())
    }
}
