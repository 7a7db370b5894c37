//! # Receipts
//!
//! What each mutating oracle call reports back: the committed facts plus the
//! outcome of the notification hook that followed.

use serde::Serialize;

use optimist_arbitration::Question;
use optimist_core::{Address, Amount, RequestId, Timestamp};

use crate::notify::CallbackOutcome;
use crate::request::{DisputeId, Resolution};
use crate::settlement::Payout;

/// Result of a successful proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalReceipt {
    /// Request proposed on.
    pub request: RequestId,
    /// Beneficiary.
    pub proposer: Address,
    /// Bond staked.
    pub bond: Amount,
    /// Final fee staked.
    pub final_fee: Amount,
    /// End of the dispute window.
    pub expiry: Timestamp,
    /// `on_propose` delivery.
    pub callback: CallbackOutcome,
}

/// Result of a successful dispute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisputeReceipt {
    /// Request disputed.
    pub request: RequestId,
    /// New dispute.
    pub dispute: DisputeId,
    /// Beneficiary.
    pub disputer: Address,
    /// Question submitted to the arbitrator.
    pub question: Question,
    /// Reward returned to the requester.
    pub refund: Amount,
    /// `on_dispute` delivery.
    pub callback: CallbackOutcome,
}

/// Result of settling a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementReceipt<V> {
    /// Request settled.
    pub request: RequestId,
    /// Finalized value.
    pub value: V,
    /// How it was finalized.
    pub resolution: Resolution,
    /// Every push made.
    pub payouts: Vec<Payout>,
    /// `on_settle` delivery.
    pub callback: CallbackOutcome,
}

/// Result of settling a superseded dispute branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchReceipt<V> {
    /// Request the branch belongs to.
    pub request: RequestId,
    /// Branch settled.
    pub dispute: DisputeId,
    /// Arbitrator's answer.
    pub answer: V,
    /// Whether the proposer won.
    pub proposer_won: bool,
    /// Every push made.
    pub payouts: Vec<Payout>,
}
