//! # In-Memory Ledger
//!
//! A process-local [`EscrowLedger`] for simulations and tests. Balances,
//! allowances and escrow accounts live behind one `parking_lot::Mutex`;
//! a batch is applied to a scratch copy of the touched entries and only
//! written back once every leg has succeeded.

use std::collections::HashMap;

use parking_lot::Mutex;

use optimist_core::{Address, Amount, Currency, RequestId};

use crate::error::EscrowError;
use crate::ledger::EscrowLedger;
use crate::transfer::{LedgerEntry, TransferBatch, TransferKind};

type AccountKey = (Address, Currency);
type EscrowKey = (RequestId, Currency);

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountKey, Amount>,
    allowances: HashMap<AccountKey, Amount>,
    escrow: HashMap<EscrowKey, Amount>,
    journal: Vec<LedgerEntry>,
}

/// Thread-safe in-memory ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `holder` with freshly created value.
    pub fn mint(
        &self,
        holder: Address,
        currency: &Currency,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        let mut state = self.state.lock();
        let entry = state
            .balances
            .entry((holder, currency.clone()))
            .or_default();
        *entry = entry.checked_add(amount).map_err(|_| EscrowError::Overflow {
            account: holder.to_string(),
            currency: currency.to_string(),
        })?;
        Ok(())
    }

    /// Set the amount `owner` lets the protocol pull. Replaces any previous
    /// approval.
    pub fn approve(&self, owner: Address, currency: &Currency, amount: Amount) {
        self.state
            .lock()
            .allowances
            .insert((owner, currency.clone()), amount);
    }

    /// Every applied transfer, oldest first.
    pub fn journal(&self) -> Vec<LedgerEntry> {
        self.state.lock().journal.clone()
    }

    /// Journal entries for one request.
    pub fn journal_for(&self, request: &RequestId) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|e| &e.request == request)
            .cloned()
            .collect()
    }

    /// All value in `currency`: participant balances plus escrow. Only
    /// [`mint`](Self::mint) changes it.
    pub fn total_supply(&self, currency: &Currency) -> Result<Amount, EscrowError> {
        let state = self.state.lock();
        let held = state
            .balances
            .iter()
            .filter(|((_, c), _)| c == currency)
            .map(|(_, a)| *a);
        let escrowed = state
            .escrow
            .iter()
            .filter(|((_, c), _)| c == currency)
            .map(|(_, a)| *a);
        Amount::checked_sum(held.chain(escrowed)).map_err(|_| EscrowError::Overflow {
            account: "total supply".to_string(),
            currency: currency.to_string(),
        })
    }
}

impl EscrowLedger for InMemoryLedger {
    fn balance_of(&self, holder: &Address, currency: &Currency) -> Amount {
        self.state
            .lock()
            .balances
            .get(&(*holder, currency.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, currency: &Currency) -> Amount {
        self.state
            .lock()
            .allowances
            .get(&(*owner, currency.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn escrowed(&self, request: &RequestId, currency: &Currency) -> Amount {
        self.state
            .lock()
            .escrow
            .get(&(*request, currency.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn execute(&self, batch: &TransferBatch) -> Result<(), EscrowError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock();
        let currency = batch.currency();
        let escrow_key = (*batch.request(), currency.clone());

        // Scratch copies of everything the batch touches.
        let mut balances: HashMap<Address, Amount> = HashMap::new();
        let mut allowances: HashMap<Address, Amount> = HashMap::new();
        let mut escrow = state.escrow.get(&escrow_key).copied().unwrap_or_default();

        for leg in batch.legs() {
            let account = (leg.party, currency.clone());
            let balance = balances
                .entry(leg.party)
                .or_insert_with(|| state.balances.get(&account).copied().unwrap_or_default());
            match leg.kind {
                TransferKind::Pull => {
                    let allowance = allowances.entry(leg.party).or_insert_with(|| {
                        state.allowances.get(&account).copied().unwrap_or_default()
                    });
                    if *allowance < leg.amount {
                        return Err(EscrowError::InsufficientAllowance {
                            owner: leg.party.to_string(),
                            currency: currency.to_string(),
                            required: leg.amount,
                            approved: *allowance,
                        });
                    }
                    if *balance < leg.amount {
                        return Err(EscrowError::InsufficientFunds {
                            holder: leg.party.to_string(),
                            currency: currency.to_string(),
                            required: leg.amount,
                            available: *balance,
                        });
                    }
                    *allowance = Amount::new(allowance.get() - leg.amount.get());
                    *balance = Amount::new(balance.get() - leg.amount.get());
                    escrow = escrow.checked_add(leg.amount).map_err(|_| EscrowError::Overflow {
                        account: batch.request().to_string(),
                        currency: currency.to_string(),
                    })?;
                }
                TransferKind::Push => {
                    if escrow < leg.amount {
                        return Err(EscrowError::EscrowUnderflow {
                            request: batch.request().to_string(),
                            currency: currency.to_string(),
                            required: leg.amount,
                            available: escrow,
                        });
                    }
                    escrow = Amount::new(escrow.get() - leg.amount.get());
                    *balance = balance.checked_add(leg.amount).map_err(|_| {
                        EscrowError::Overflow {
                            account: leg.party.to_string(),
                            currency: currency.to_string(),
                        }
                    })?;
                }
            }
        }

        // Commit.
        for (party, amount) in balances {
            state.balances.insert((party, currency.clone()), amount);
        }
        for (party, amount) in allowances {
            state.allowances.insert((party, currency.clone()), amount);
        }
        state.escrow.insert(escrow_key, escrow);
        let mut sequence = state.journal.len() as u64;
        for leg in batch.legs() {
            state.journal.push(LedgerEntry {
                sequence,
                request: *batch.request(),
                currency: currency.clone(),
                kind: leg.kind,
                party: leg.party,
                amount: leg.amount,
            });
            sequence += 1;
        }
        tracing::debug!(
            request = %batch.request(),
            currency = %currency,
            legs = batch.legs().len(),
            escrowed = %escrow,
            "applied transfer batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimist_core::{AncillaryData, Identifier, RequestKey, Timestamp};

    fn usdc() -> Currency {
        Currency::new("USDC").unwrap()
    }

    fn request_id(n: u64) -> RequestId {
        RequestKey::new(
            Address::from_low_u64(n),
            Identifier::new("TEST").unwrap(),
            Timestamp::from_epoch_secs(0).unwrap(),
            AncillaryData::empty(),
        )
        .id()
        .unwrap()
    }

    fn funded(holder: Address, amount: u128) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.mint(holder, &usdc(), Amount::new(amount)).unwrap();
        ledger.approve(holder, &usdc(), Amount::new(amount));
        ledger
    }

    #[test]
    fn pull_moves_value_into_escrow() {
        let alice = Address::from_low_u64(0xa);
        let ledger = funded(alice, 100);
        let req = request_id(1);
        ledger.pull(req, &usdc(), alice, Amount::new(40)).unwrap();
        assert_eq!(ledger.balance_of(&alice, &usdc()), Amount::new(60));
        assert_eq!(ledger.allowance(&alice, &usdc()), Amount::new(60));
        assert_eq!(ledger.escrowed(&req, &usdc()), Amount::new(40));
    }

    #[test]
    fn push_moves_value_out_of_escrow() {
        let alice = Address::from_low_u64(0xa);
        let bob = Address::from_low_u64(0xb);
        let ledger = funded(alice, 100);
        let req = request_id(1);
        ledger.pull(req, &usdc(), alice, Amount::new(40)).unwrap();
        ledger.push(req, &usdc(), bob, Amount::new(25)).unwrap();
        assert_eq!(ledger.balance_of(&bob, &usdc()), Amount::new(25));
        assert_eq!(ledger.escrowed(&req, &usdc()), Amount::new(15));
    }

    #[test]
    fn pull_without_allowance_fails() {
        let alice = Address::from_low_u64(0xa);
        let ledger = InMemoryLedger::new();
        ledger.mint(alice, &usdc(), Amount::new(100)).unwrap();
        let err = ledger
            .pull(request_id(1), &usdc(), alice, Amount::new(1))
            .unwrap_err();
        assert!(matches!(err, EscrowError::InsufficientAllowance { .. }));
    }

    #[test]
    fn pull_without_balance_fails() {
        let alice = Address::from_low_u64(0xa);
        let ledger = InMemoryLedger::new();
        ledger.approve(alice, &usdc(), Amount::new(100));
        let err = ledger
            .pull(request_id(1), &usdc(), alice, Amount::new(1))
            .unwrap_err();
        assert!(matches!(err, EscrowError::InsufficientFunds { .. }));
    }

    #[test]
    fn push_beyond_escrow_fails() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .push(request_id(1), &usdc(), Address::from_low_u64(2), Amount::new(1))
            .unwrap_err();
        assert!(matches!(err, EscrowError::EscrowUnderflow { .. }));
    }

    #[test]
    fn failed_batch_changes_nothing() {
        let alice = Address::from_low_u64(0xa);
        let bob = Address::from_low_u64(0xb);
        let ledger = funded(alice, 100);
        let req = request_id(1);
        // First leg would succeed, second fails: bob has nothing.
        let batch = TransferBatch::new(req, usdc())
            .pull(alice, Amount::new(50))
            .pull(bob, Amount::new(50));
        assert!(ledger.execute(&batch).is_err());
        assert_eq!(ledger.balance_of(&alice, &usdc()), Amount::new(100));
        assert_eq!(ledger.allowance(&alice, &usdc()), Amount::new(100));
        assert_eq!(ledger.escrowed(&req, &usdc()), Amount::ZERO);
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn batch_can_push_what_it_pulled() {
        let alice = Address::from_low_u64(0xa);
        let carol = Address::from_low_u64(0xc);
        let ledger = funded(alice, 100);
        let req = request_id(1);
        let batch = TransferBatch::new(req, usdc())
            .pull(alice, Amount::new(30))
            .push(carol, Amount::new(30));
        ledger.execute(&batch).unwrap();
        assert_eq!(ledger.balance_of(&carol, &usdc()), Amount::new(30));
        assert_eq!(ledger.escrowed(&req, &usdc()), Amount::ZERO);
        assert_eq!(ledger.journal().len(), 2);
    }

    #[test]
    fn repeated_pulls_from_one_party_share_allowance() {
        let alice = Address::from_low_u64(0xa);
        let ledger = funded(alice, 100);
        let batch = TransferBatch::new(request_id(1), usdc())
            .pull(alice, Amount::new(60))
            .pull(alice, Amount::new(60));
        assert!(matches!(
            ledger.execute(&batch),
            Err(EscrowError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn escrow_accounts_are_per_request() {
        let alice = Address::from_low_u64(0xa);
        let ledger = funded(alice, 100);
        let (r1, r2) = (request_id(1), request_id(2));
        ledger.pull(r1, &usdc(), alice, Amount::new(10)).unwrap();
        assert!(ledger
            .push(r2, &usdc(), alice, Amount::new(1))
            .is_err());
        assert_eq!(ledger.journal_for(&r1).len(), 1);
        assert!(ledger.journal_for(&r2).is_empty());
    }

    #[test]
    fn journal_sequences_are_monotonic() {
        let alice = Address::from_low_u64(0xa);
        let ledger = funded(alice, 100);
        let req = request_id(1);
        ledger.pull(req, &usdc(), alice, Amount::new(1)).unwrap();
        ledger.pull(req, &usdc(), alice, Amount::new(2)).unwrap();
        let seqs: Vec<u64> = ledger.journal().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn supply_is_conserved(
                pulls in proptest::collection::vec(0u128..1_000, 1..8),
                push_fraction in 0u128..=100,
            ) {
                let alice = Address::from_low_u64(0xa);
                let bob = Address::from_low_u64(0xb);
                let ledger = funded(alice, 1_000_000);
                let req = request_id(9);
                let before = ledger.total_supply(&usdc()).unwrap();
                for amount in &pulls {
                    ledger.pull(req, &usdc(), alice, Amount::new(*amount)).unwrap();
                }
                let held = ledger.escrowed(&req, &usdc());
                let out = Amount::new(held.get() * push_fraction / 100);
                ledger.push(req, &usdc(), bob, out).unwrap();
                prop_assert_eq!(ledger.total_supply(&usdc()).unwrap(), before);
            }
        }
    }
}
