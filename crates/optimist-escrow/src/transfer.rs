//! # Transfers
//!
//! A [`TransferBatch`] collects the pulls and pushes one protocol operation
//! needs against a single request's escrow account. The ledger applies the
//! legs in order, so a batch may push value it pulled earlier in the same
//! batch (a refund alongside a dispute bond).

use serde::{Deserialize, Serialize};

use optimist_core::{Address, Amount, CoreError, Currency, RequestId};

/// Direction of a transfer relative to the escrow account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// Participant to escrow.
    Pull,
    /// Escrow to participant.
    Push,
}

impl TransferKind {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "PULL",
            Self::Push => "PUSH",
        }
    }
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leg of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Pull or push.
    pub kind: TransferKind,
    /// Payer for a pull, payee for a push.
    pub party: Address,
    /// Amount moved.
    pub amount: Amount,
}

/// Ordered legs against one request's escrow in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferBatch {
    request: RequestId,
    currency: Currency,
    legs: Vec<Transfer>,
}

impl TransferBatch {
    /// An empty batch.
    pub fn new(request: RequestId, currency: Currency) -> Self {
        Self {
            request,
            currency,
            legs: Vec::new(),
        }
    }

    /// Append a pull. Zero amounts are dropped.
    pub fn pull(mut self, from: Address, amount: Amount) -> Self {
        self.add(TransferKind::Pull, from, amount);
        self
    }

    /// Append a push. Zero amounts are dropped.
    pub fn push(mut self, to: Address, amount: Amount) -> Self {
        self.add(TransferKind::Push, to, amount);
        self
    }

    /// In-place variant of [`pull`](Self::pull)/[`push`](Self::push).
    pub fn add(&mut self, kind: TransferKind, party: Address, amount: Amount) {
        if !amount.is_zero() {
            self.legs.push(Transfer {
                kind,
                party,
                amount,
            });
        }
    }

    /// The request whose escrow this batch touches.
    pub fn request(&self) -> &RequestId {
        &self.request
    }

    /// The batch currency.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Legs in application order.
    pub fn legs(&self) -> &[Transfer] {
        &self.legs
    }

    /// Whether there is nothing to move.
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Sum of all legs of `kind`.
    pub fn total(&self, kind: TransferKind) -> Result<Amount, CoreError> {
        Amount::checked_sum(
            self.legs
                .iter()
                .filter(|leg| leg.kind == kind)
                .map(|leg| leg.amount),
        )
    }

    /// Sum pushed to `party`.
    pub fn pushed_to(&self, party: &Address) -> Result<Amount, CoreError> {
        Amount::checked_sum(
            self.legs
                .iter()
                .filter(|leg| leg.kind == TransferKind::Push && &leg.party == party)
                .map(|leg| leg.amount),
        )
    }
}

/// A journaled, applied transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic position in the journal.
    pub sequence: u64,
    /// Escrow account touched.
    pub request: RequestId,
    /// Currency moved.
    pub currency: Currency,
    /// Pull or push.
    pub kind: TransferKind,
    /// Counterparty.
    pub party: Address,
    /// Amount moved.
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimist_core::{AncillaryData, Identifier, RequestKey, Timestamp};

    fn request_id() -> RequestId {
        RequestKey::new(
            Address::from_low_u64(1),
            Identifier::new("TEST").unwrap(),
            Timestamp::from_epoch_secs(0).unwrap(),
            AncillaryData::empty(),
        )
        .id()
        .unwrap()
    }

    #[test]
    fn zero_legs_are_dropped() {
        let batch = TransferBatch::new(request_id(), Currency::new("USDC").unwrap())
            .pull(Address::from_low_u64(2), Amount::ZERO)
            .push(Address::from_low_u64(3), Amount::new(1));
        assert_eq!(batch.legs().len(), 1);
        assert_eq!(batch.legs()[0].kind, TransferKind::Push);
    }

    #[test]
    fn totals_by_kind_and_party() {
        let a = Address::from_low_u64(2);
        let b = Address::from_low_u64(3);
        let batch = TransferBatch::new(request_id(), Currency::new("USDC").unwrap())
            .pull(a, Amount::new(10))
            .pull(b, Amount::new(5))
            .push(a, Amount::new(4))
            .push(a, Amount::new(3))
            .push(b, Amount::new(8));
        assert_eq!(batch.total(TransferKind::Pull).unwrap(), Amount::new(15));
        assert_eq!(batch.total(TransferKind::Push).unwrap(), Amount::new(15));
        assert_eq!(batch.pushed_to(&a).unwrap(), Amount::new(7));
        assert_eq!(batch.pushed_to(&b).unwrap(), Amount::new(8));
    }

    #[test]
    fn empty_batch() {
        let batch = TransferBatch::new(request_id(), Currency::new("USDC").unwrap());
        assert!(batch.is_empty());
        assert_eq!(batch.total(TransferKind::Pull).unwrap(), Amount::ZERO);
    }

    #[test]
    fn transfer_kind_display() {
        assert_eq!(TransferKind::Pull.to_string(), "PULL");
        assert_eq!(TransferKind::Push.to_string(), "PUSH");
    }
}
