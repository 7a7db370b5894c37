//! # Escrow Ledger Boundary
//!
//! Everything the oracle needs from a value-transfer service. Implementations
//! must fail rather than truncate when a payer is short, and must apply a
//! [`TransferBatch`] atomically.

use optimist_core::{Address, Amount, Currency, RequestId};

use crate::error::EscrowError;
use crate::transfer::TransferBatch;

/// A value-transfer service holding participant balances and per-request
/// escrow accounts.
pub trait EscrowLedger: Send + Sync {
    /// Spendable balance of `holder`.
    fn balance_of(&self, holder: &Address, currency: &Currency) -> Amount;

    /// Amount `owner` has approved the protocol to pull.
    fn allowance(&self, owner: &Address, currency: &Currency) -> Amount;

    /// Value currently held in escrow for `request`.
    fn escrowed(&self, request: &RequestId, currency: &Currency) -> Amount;

    /// Apply every leg of `batch` or none of them.
    fn execute(&self, batch: &TransferBatch) -> Result<(), EscrowError>;

    /// Pull `amount` from `from` into `request`'s escrow.
    fn pull(
        &self,
        request: RequestId,
        currency: &Currency,
        from: Address,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        self.execute(&TransferBatch::new(request, currency.clone()).pull(from, amount))
    }

    /// Push `amount` from `request`'s escrow to `to`.
    fn push(
        &self,
        request: RequestId,
        currency: &Currency,
        to: Address,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        self.execute(&TransferBatch::new(request, currency.clone()).push(to, amount))
    }
}
