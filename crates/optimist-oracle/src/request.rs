//! # Request Records
//!
//! The stored shape of a request and everything that has happened to it.
//!
//! A record holds at most one *live* proposal. Disputing moves the live
//! proposal into a [`DisputeRecord`] together with the dispute and the
//! question sent to the arbitrator, which frees the slot for a re-proposal.
//! The most recent dispute is *authoritative* only while no later proposal
//! is live and the request is unsettled; every other dispute is
//! *superseded* and can only move bonds, never the request's value.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use optimist_arbitration::Question;
use optimist_core::{Address, AncillaryData, Amount, Currency, RequestId, RequestKey, Timestamp};

use crate::settlement::Payout;

// ── Identifiers ────────────────────────────────────────────────────────

/// Identifies one dispute on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisputeId(Uuid);

impl DisputeId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// From an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DisputeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DisputeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispute:{}", self.0)
    }
}

// ── Settings ───────────────────────────────────────────────────────────

/// Which notification hooks fire for a request. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackFlags {
    /// Fire `on_propose`.
    #[serde(default)]
    pub on_propose: bool,
    /// Fire `on_dispute`.
    #[serde(default)]
    pub on_dispute: bool,
    /// Fire `on_settle`.
    #[serde(default)]
    pub on_settle: bool,
}

impl CallbackFlags {
    /// Every hook enabled.
    pub const ALL: CallbackFlags = CallbackFlags {
        on_propose: true,
        on_dispute: true,
        on_settle: true,
    };
}

/// Requester-controlled options, frozen at the first proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Replaces the default bond.
    pub custom_bond: Option<Amount>,
    /// Replaces the default liveness, in seconds.
    pub custom_liveness_secs: Option<u64>,
    /// Return the reward to the requester on the first dispute.
    pub refund_on_dispute: bool,
    /// The question concerns an event; see [`crate::OptimisticOracle::set_event_based`].
    pub event_based: bool,
    /// Enabled notification hooks.
    pub callbacks: CallbackFlags,
}

// ── Proposal / Dispute ─────────────────────────────────────────────────

/// A bonded answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposal<V> {
    /// Beneficiary of the proposal.
    pub proposer: Address,
    /// Proposed answer.
    pub value: V,
    /// When it was proposed.
    pub proposal_time: Timestamp,
    /// End of the dispute window (exclusive).
    pub expiry: Timestamp,
    /// Bond staked by the proposer and required of a disputer.
    pub bond: Amount,
    /// Final fee staked alongside the bond.
    pub final_fee: Amount,
}

impl<V> Proposal<V> {
    /// Bond plus final fee: what each side stakes.
    pub fn stake(&self) -> Result<Amount, optimist_core::CoreError> {
        self.bond.checked_add(self.final_fee)
    }
}

/// A bonded challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Beneficiary of the dispute.
    pub disputer: Address,
    /// When the dispute was raised.
    pub dispute_time: Timestamp,
}

/// Outcome of one dispute branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchSettlement<V> {
    /// The arbitrator's answer.
    pub answer: V,
    /// Whether the answer matched the proposal.
    pub proposer_won: bool,
    /// When the branch was paid out.
    pub settled_at: Timestamp,
    /// Transfers made for this branch.
    pub payouts: Vec<Payout>,
}

/// A disputed proposal and its escalation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisputeRecord<V> {
    /// Dispute id.
    pub id: DisputeId,
    /// The proposal that was challenged.
    pub proposal: Proposal<V>,
    /// The challenge.
    pub dispute: Dispute,
    /// What the arbitrator was asked.
    pub question: Question,
    /// Set once the branch's bonds are paid out.
    pub settlement: Option<BranchSettlement<V>>,
}

// ── Settlement ─────────────────────────────────────────────────────────

/// How a request's value was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// An undisputed proposal outlived its liveness window.
    Expired,
    /// The arbitrator answered the authoritative dispute.
    Arbitrated {
        /// The dispute that decided the value.
        dispute: DisputeId,
    },
}

impl Resolution {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "EXPIRED",
            Self::Arbitrated { .. } => "ARBITRATED",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal record of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement<V> {
    /// Finalized value.
    pub value: V,
    /// How it was finalized.
    pub resolution: Resolution,
    /// When.
    pub settled_at: Timestamp,
    /// Transfers made by the settling call.
    pub payouts: Vec<Payout>,
}

// ── RequestRecord ──────────────────────────────────────────────────────

/// Everything stored for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord<V> {
    /// The request key.
    pub key: RequestKey,
    /// Digest of the key.
    pub id: RequestId,
    /// Reward, bond and fee currency.
    pub currency: Currency,
    /// Reward escrowed at creation.
    pub reward: Amount,
    /// Reward still in escrow, payable at settlement.
    pub reward_outstanding: Amount,
    /// Final fee captured at creation.
    pub final_fee: Amount,
    /// Bond used when neither a custom bond nor an override applies.
    pub default_bond: Amount,
    /// When the request was created.
    pub created_at: Timestamp,
    /// Ancillary data as the arbitrator sees it.
    pub stamped_ancillary_data: AncillaryData,
    /// Requester options.
    pub settings: RequestSettings,
    /// The undisputed proposal currently running, if any.
    pub live: Option<Proposal<V>>,
    /// Every dispute, oldest first.
    pub disputes: Vec<DisputeRecord<V>>,
    /// Set once the request is finalized.
    pub settlement: Option<Settlement<V>>,
}

impl<V> RequestRecord<V> {
    /// Bond a proposal must stake absent a per-call override.
    pub fn effective_bond(&self) -> Amount {
        self.settings.custom_bond.unwrap_or(self.default_bond)
    }

    /// Liveness applying to new proposals.
    pub fn liveness_secs(&self, default_secs: u64) -> u64 {
        self.settings.custom_liveness_secs.unwrap_or(default_secs)
    }

    /// The dispute that will decide the value once answered: the newest
    /// one, provided no later proposal is live and the request is open.
    pub fn authoritative_dispute(&self) -> Option<&DisputeRecord<V>> {
        if self.live.is_some() || self.settlement.is_some() {
            return None;
        }
        self.disputes.last()
    }

    /// Position of a dispute by id.
    pub fn dispute_index(&self, id: &DisputeId) -> Option<usize> {
        self.disputes.iter().position(|d| &d.id == id)
    }

    /// Whether the dispute at `index` can no longer decide the value.
    pub fn is_superseded(&self, index: usize) -> bool {
        match self.authoritative_dispute() {
            Some(head) => self.disputes.get(index).map(|d| d.id) != Some(head.id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimist_core::Identifier;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    fn record() -> RequestRecord<i128> {
        let key = RequestKey::new(
            Address::from_low_u64(1),
            Identifier::new("TEST").unwrap(),
            ts(0),
            AncillaryData::empty(),
        );
        RequestRecord {
            id: key.id().unwrap(),
            stamped_ancillary_data: key.stamped_ancillary_data(),
            key,
            currency: Currency::new("USDC").unwrap(),
            reward: Amount::ZERO,
            reward_outstanding: Amount::ZERO,
            final_fee: Amount::new(10),
            default_bond: Amount::new(10),
            created_at: ts(0),
            settings: RequestSettings::default(),
            live: None,
            disputes: Vec::new(),
            settlement: None,
        }
    }

    fn proposal(value: i128) -> Proposal<i128> {
        Proposal {
            proposer: Address::from_low_u64(2),
            value,
            proposal_time: ts(10),
            expiry: ts(20),
            bond: Amount::new(10),
            final_fee: Amount::new(10),
        }
    }

    fn dispute_record(value: i128) -> DisputeRecord<i128> {
        DisputeRecord {
            id: DisputeId::new(),
            proposal: proposal(value),
            dispute: Dispute {
                disputer: Address::from_low_u64(3),
                dispute_time: ts(15),
            },
            question: Question::new(
                Identifier::new("TEST").unwrap(),
                ts(0),
                AncillaryData::empty(),
            ),
            settlement: None,
        }
    }

    #[test]
    fn custom_bond_overrides_default() {
        let mut r = record();
        assert_eq!(r.effective_bond(), Amount::new(10));
        r.settings.custom_bond = Some(Amount::new(77));
        assert_eq!(r.effective_bond(), Amount::new(77));
    }

    #[test]
    fn custom_liveness_overrides_default() {
        let mut r = record();
        assert_eq!(r.liveness_secs(7200), 7200);
        r.settings.custom_liveness_secs = Some(60);
        assert_eq!(r.liveness_secs(7200), 60);
    }

    #[test]
    fn newest_dispute_is_authoritative_without_live_proposal() {
        let mut r = record();
        r.disputes.push(dispute_record(1));
        r.disputes.push(dispute_record(2));
        let head = r.authoritative_dispute().unwrap().id;
        assert_eq!(head, r.disputes[1].id);
        assert!(r.is_superseded(0));
        assert!(!r.is_superseded(1));
    }

    #[test]
    fn live_proposal_supersedes_every_dispute() {
        let mut r = record();
        r.disputes.push(dispute_record(1));
        r.live = Some(proposal(5));
        assert!(r.authoritative_dispute().is_none());
        assert!(r.is_superseded(0));
    }

    #[test]
    fn stake_sums_bond_and_fee() {
        assert_eq!(proposal(0).stake().unwrap(), Amount::new(20));
    }

    #[test]
    fn dispute_id_display() {
        let id = DisputeId::from_uuid(Uuid::nil());
        assert_eq!(
            id.to_string(),
            "dispute:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(id.as_uuid(), &Uuid::nil());
    }

    #[test]
    fn resolution_display() {
        assert_eq!(Resolution::Expired.to_string(), "EXPIRED");
        let r = Resolution::Arbitrated {
            dispute: DisputeId::new(),
        };
        assert_eq!(r.to_string(), "ARBITRATED");
    }
}
