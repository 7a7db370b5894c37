//! # Escrow Error Types
//!
//! Every variant names the account and currency involved plus the amounts
//! that did not line up, so a failed batch can be diagnosed from the error
//! alone.

use thiserror::Error;

use optimist_core::Amount;

/// Errors raised by an escrow ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// The payer's balance does not cover the pull.
    #[error("insufficient funds: {holder} holds {available} {currency}, needs {required}")]
    InsufficientFunds {
        /// The paying account.
        holder: String,
        /// Currency code.
        currency: String,
        /// Amount the batch needs from this account.
        required: Amount,
        /// Amount the account holds.
        available: Amount,
    },

    /// The payer has not approved enough for the protocol to pull.
    #[error("insufficient allowance: {owner} approved {approved} {currency}, needs {required}")]
    InsufficientAllowance {
        /// The paying account.
        owner: String,
        /// Currency code.
        currency: String,
        /// Amount the batch needs from this account.
        required: Amount,
        /// Amount currently approved.
        approved: Amount,
    },

    /// A push would take more out of a request's escrow than it holds.
    #[error("escrow underflow for {request}: holds {available} {currency}, push needs {required}")]
    EscrowUnderflow {
        /// The request whose escrow account is short.
        request: String,
        /// Currency code.
        currency: String,
        /// Amount the push needs.
        required: Amount,
        /// Amount held in escrow.
        available: Amount,
    },

    /// A credit would overflow an account balance.
    #[error("balance overflow crediting {account} in {currency}")]
    Overflow {
        /// The account being credited.
        account: String,
        /// Currency code.
        currency: String,
    },

    /// A remote ledger could not be reached or refused the batch.
    #[error("ledger unavailable: {reason}")]
    Unavailable {
        /// Transport or backend failure description.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_display() {
        let err = EscrowError::InsufficientFunds {
            holder: "0xaa".to_string(),
            currency: "USDC".to_string(),
            required: Amount::new(10),
            available: Amount::new(3),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: 0xaa holds 3 USDC, needs 10"
        );
    }

    #[test]
    fn escrow_underflow_display() {
        let err = EscrowError::EscrowUnderflow {
            request: "request:deadbeef".to_string(),
            currency: "USDC".to_string(),
            required: Amount::new(5),
            available: Amount::ZERO,
        };
        assert!(err.to_string().contains("request:deadbeef"));
    }
}
