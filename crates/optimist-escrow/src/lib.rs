//! # optimist-escrow — Escrow Ledger Boundary
//!
//! The oracle never owns balances. It asks an [`EscrowLedger`] to pull value
//! from participants into a per-request escrow account and to push it back
//! out at settlement. This crate defines that boundary and an
//! [`InMemoryLedger`] used by simulations and tests.
//!
//! ## Security Invariant
//!
//! A [`TransferBatch`] is all-or-nothing. If any leg fails (missing balance,
//! missing allowance, escrow underflow) no leg is applied and the ledger is
//! unchanged. Escrow accounts can never go negative.
//!
//! ## Crate Policy
//!
//! - Depends only on `optimist-core` internally.
//! - No `.unwrap()` outside tests.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod transfer;

pub use error::EscrowError;
pub use ledger::EscrowLedger;
pub use memory::InMemoryLedger;
pub use transfer::{LedgerEntry, Transfer, TransferBatch, TransferKind};
