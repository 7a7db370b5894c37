//! # Error Types
//!
//! Errors raised while constructing or combining core primitives. Higher
//! layers wrap [`CoreError`] with `#[from]` rather than re-describing it.

use thiserror::Error;

/// Error raised by core primitive constructors and arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Canonical serialization of a key or record failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A timestamp string or epoch value could not be interpreted.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An account address was malformed.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A topic identifier was empty or too long.
    #[error("invalid identifier {input:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A currency code was empty or contained illegal characters.
    #[error("invalid currency {input:?}: {reason}")]
    InvalidCurrency {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A decimal amount string could not be parsed.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Checked arithmetic overflowed or underflowed.
    #[error("arithmetic overflow in {operation}")]
    Overflow {
        /// The operation that overflowed (e.g. "amount add").
        operation: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// Float values have no canonical form here; amounts travel as strings.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(String),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

impl From<serde_json::Error> for CanonicalizationError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationFailed(e.to_string())
    }
}
