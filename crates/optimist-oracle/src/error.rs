//! # Oracle Error Types
//!
//! One enum for every failure a caller of the oracle can observe. All
//! validation failures surface synchronously; nothing is retried inside the
//! oracle. A returned error means no request state changed and no value
//! moved.
//!
//! Ledger shortfalls are lifted into [`OracleError::InsufficientFunds`] and
//! [`OracleError::InsufficientAllowance`] so callers match a single enum.

use thiserror::Error;

use optimist_arbitration::ArbitrationError;
use optimist_core::{Amount, CoreError};
use optimist_escrow::EscrowError;

use crate::config::ConfigError;
use crate::liveness::InvalidLiveness;

/// Errors returned by [`crate::OptimisticOracle`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// A request with this key already exists.
    #[error("request {request} already exists")]
    DuplicateRequest {
        /// Request id.
        request: String,
    },

    /// No request exists for this key.
    #[error("request {request} does not exist")]
    UnknownRequest {
        /// Request id.
        request: String,
    },

    /// The topic validator does not support the identifier.
    #[error("unsupported identifier {identifier}")]
    UnsupportedTopic {
        /// Rejected identifier.
        identifier: String,
    },

    /// The reward currency has no final fee configured.
    #[error("unsupported currency {currency}")]
    UnsupportedCurrency {
        /// Rejected currency.
        currency: String,
    },

    /// The request timestamp lies after the current clock time.
    #[error("request timestamp {timestamp} is after current time {now}")]
    FutureTimestamp {
        /// Request timestamp.
        timestamp: String,
        /// Clock time at the call.
        now: String,
    },

    /// Stamped ancillary data exceeds the configured limit.
    #[error("stamped ancillary data is {len} bytes, limit is {max}")]
    AncillaryDataTooLong {
        /// Stamped length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// The payer's balance does not cover the required stake.
    #[error("insufficient funds: {holder} holds {available} {currency}, needs {required}")]
    InsufficientFunds {
        /// Paying account.
        holder: String,
        /// Currency code.
        currency: String,
        /// Amount required.
        required: Amount,
        /// Amount held.
        available: Amount,
    },

    /// The payer has not approved enough for the oracle to pull.
    #[error("insufficient allowance: {owner} approved {approved} {currency}, needs {required}")]
    InsufficientAllowance {
        /// Paying account.
        owner: String,
        /// Currency code.
        currency: String,
        /// Amount required.
        required: Amount,
        /// Amount approved.
        approved: Amount,
    },

    /// A liveness value is outside the accepted band.
    #[error(transparent)]
    InvalidLiveness(#[from] InvalidLiveness),

    /// The proposal's liveness window has closed.
    #[error("proposal for {request} expired at {expiry} (now {now})")]
    AlreadyExpired {
        /// Request id.
        request: String,
        /// Proposal expiry.
        expiry: String,
        /// Clock time at the call.
        now: String,
    },

    /// There is no live proposal to dispute.
    #[error("request {request} has no active proposal")]
    NoActiveProposal {
        /// Request id.
        request: String,
    },

    /// Settlement is not possible yet (or ever, for this branch).
    #[error("request {request} is not settleable: {reason}")]
    NotSettleable {
        /// Request id.
        request: String,
        /// Why settlement was refused.
        reason: String,
    },

    /// The request or dispute branch has already been settled.
    #[error("{target} is already settled")]
    AlreadySettled {
        /// Request or dispute id.
        target: String,
    },

    /// Proposing or disputing on behalf of the zero address.
    #[error("{operation} on behalf of the zero address")]
    ZeroAddressTarget {
        /// The operation attempted.
        operation: String,
    },

    /// Only the requester may change a request's settings.
    #[error("{caller} is not the requester of {request}")]
    NotRequester {
        /// Request id.
        request: String,
        /// Calling account.
        caller: String,
    },

    /// Settings can only change before the first proposal.
    #[error("settings of {request} are locked in state {state}")]
    SettingsLocked {
        /// Request id.
        request: String,
        /// Current state.
        state: String,
    },

    /// The request does not accept a proposal in its current state.
    #[error("request {request} cannot accept a proposal in state {state}")]
    ProposalNotAllowed {
        /// Request id.
        request: String,
        /// Current state.
        state: String,
    },

    /// The proposed value is not acceptable for this request.
    #[error("invalid proposed value for {request}: {reason}")]
    InvalidProposedValue {
        /// Request id.
        request: String,
        /// Why the value was refused.
        reason: String,
    },

    /// No dispute with this id exists on the request.
    #[error("request {request} has no dispute {dispute}")]
    UnknownDispute {
        /// Request id.
        request: String,
        /// Dispute id.
        dispute: String,
    },

    /// Bond, fee or time arithmetic overflowed.
    #[error("arithmetic overflow in {operation}")]
    Overflow {
        /// The operation that overflowed.
        operation: String,
    },

    /// Invalid oracle configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A core primitive failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The escrow ledger failed for a reason other than a shortfall.
    #[error("escrow ledger error: {0}")]
    Escrow(EscrowError),

    /// The arbitrator bridge failed.
    #[error("arbitrator error: {0}")]
    Arbitration(#[from] ArbitrationError),
}

impl From<EscrowError> for OracleError {
    fn from(e: EscrowError) -> Self {
        match e {
            EscrowError::InsufficientFunds {
                holder,
                currency,
                required,
                available,
            } => Self::InsufficientFunds {
                holder,
                currency,
                required,
                available,
            },
            EscrowError::InsufficientAllowance {
                owner,
                currency,
                required,
                approved,
            } => Self::InsufficientAllowance {
                owner,
                currency,
                required,
                approved,
            },
            other => Self::Escrow(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_shortfalls_are_lifted() {
        let err: OracleError = EscrowError::InsufficientFunds {
            holder: "0xaa".to_string(),
            currency: "USDC".to_string(),
            required: Amount::new(2),
            available: Amount::new(1),
        }
        .into();
        assert!(matches!(err, OracleError::InsufficientFunds { .. }));

        let err: OracleError = EscrowError::InsufficientAllowance {
            owner: "0xaa".to_string(),
            currency: "USDC".to_string(),
            required: Amount::new(2),
            approved: Amount::ZERO,
        }
        .into();
        assert!(matches!(err, OracleError::InsufficientAllowance { .. }));
    }

    #[test]
    fn other_escrow_errors_are_wrapped() {
        let err: OracleError = EscrowError::Unavailable {
            reason: "down".to_string(),
        }
        .into();
        assert!(matches!(err, OracleError::Escrow(_)));
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn already_expired_display() {
        let err = OracleError::AlreadyExpired {
            request: "request:0badf00d".to_string(),
            expiry: "2026-01-01T02:00:00Z".to_string(),
            now: "2026-01-01T02:00:00Z".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "proposal for request:0badf00d expired at 2026-01-01T02:00:00Z (now 2026-01-01T02:00:00Z)"
        );
    }

    #[test]
    fn invalid_liveness_is_transparent() {
        let err: OracleError = crate::liveness::validate(0).unwrap_err().into();
        assert!(err.to_string().starts_with("liveness 0s outside"));
    }

    #[test]
    fn zero_address_display() {
        let err = OracleError::ZeroAddressTarget {
            operation: "propose".to_string(),
        };
        assert_eq!(err.to_string(), "propose on behalf of the zero address");
    }
}
