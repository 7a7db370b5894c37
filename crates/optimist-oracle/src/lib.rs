//! # optimist-oracle — Optimistic Dispute Resolution
//!
//! A requester asks a question and escrows a reward. A proposer answers it
//! and stakes a bond plus a final fee. Anyone may stake a matching bond to
//! dispute the answer before the liveness window closes; the question then
//! escalates to the arbitrator. Settlement is permissionless and pays out
//! either the undisputed proposal or the side the arbitrator agrees with.
//!
//! The state machine is generic over the answer type ([`ProposedValue`]):
//! the same oracle serves scalar prices (`i128`), funding rates
//! ([`FundingRate`]) and reward-distribution roots ([`MerkleRoot`]).
//!
//! ## Security Invariants
//!
//! - Mutations are linearized behind a single write lock on the request
//!   store. Racing `dispute` and `settle` calls observe one order.
//! - Request state is derived from stored data, the clock and the
//!   arbitrator on every read. There is no cached status to drift.
//! - Value moves only through [`optimist_escrow::TransferBatch`]es; a
//!   failed batch leaves both the ledger and the request unchanged.
//! - Escrowed value is conserved: everything pulled for a request is
//!   pushed out to the proposer, disputer, requester or fee sink, with
//!   halving remainders going to the winner.
//! - Requester callbacks run after the lock is released and their failures
//!   (including panics) never roll back a committed transition.
//!
//! ## Crate Policy
//!
//! - No `.unwrap()` outside tests.
//! - Collaborators (clock, ledger, arbitrator, topic validator) are
//!   injected as trait objects.

pub mod config;
pub mod error;
pub mod liveness;
pub mod notify;
pub mod oracle;
pub mod receipt;
pub mod request;
pub mod settlement;
pub mod state;
pub mod topic;
pub mod value;

pub use config::{ConfigError, OracleConfig};
pub use error::OracleError;
pub use liveness::{InvalidLiveness, MAX_LIVENESS_SECS, MIN_LIVENESS_SECS};
pub use notify::{
    CallbackOutcome, DisputeEvent, NotificationError, NotificationSink, ProposeEvent, SettleEvent,
};
pub use oracle::OptimisticOracle;
pub use receipt::{BranchReceipt, DisputeReceipt, ProposalReceipt, SettlementReceipt};
pub use request::{
    BranchSettlement, CallbackFlags, Dispute, DisputeId, DisputeRecord, Proposal, RequestRecord,
    RequestSettings, Resolution, Settlement,
};
pub use settlement::{Payout, PayoutKind};
pub use state::RequestState;
pub use topic::{AllowAllTopics, IdentifierWhitelist, TopicValidator};
pub use value::{FundingRate, MerkleRoot, ProposedValue, TOO_EARLY_PRICE};
