//! # Settlement Engine
//!
//! Pure payout arithmetic. Given what was staked, these functions return the
//! exact list of escrow pushes that settle a request or a dispute branch.
//! The oracle turns the list into one [`TransferBatch`] so a settlement is
//! paid out entirely or not at all.
//!
//! ## Payout rules
//!
//! With bond `B`, final fee `F` and outstanding reward `R`:
//!
//! | Outcome | Winner | Fee sink |
//! |---------|--------|----------|
//! | Undisputed expiry | proposer: `B + F + R` | nothing |
//! | Dispute, either side wins | `B + F` (own stake) + `ceil(B/2)` + `R` | `F + floor(B/2)` |
//!
//! The two disputed rows sum to `2B + 2F + R`, exactly what was escrowed for
//! the branch. An odd bond's remainder always goes to the winner.

use serde::{Deserialize, Serialize};

use optimist_core::{Address, Amount, CoreError, Currency, RequestId};
use optimist_escrow::TransferBatch;

use crate::request::Proposal;

/// Why a payout was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutKind {
    /// The winner's own bond and final fee.
    StakeReturn,
    /// The winner's share of the loser's bond.
    BondShare,
    /// The requester's reward.
    Reward,
    /// The loser's final fee and burned bond half.
    FeeSink,
}

impl PayoutKind {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StakeReturn => "STAKE_RETURN",
            Self::BondShare => "BOND_SHARE",
            Self::Reward => "REWARD",
            Self::FeeSink => "FEE_SINK",
        }
    }
}

impl std::fmt::Display for PayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One push out of a request's escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient.
    pub recipient: Address,
    /// Amount pushed.
    pub amount: Amount,
    /// Reason.
    pub kind: PayoutKind,
}

fn payout(recipient: Address, amount: Amount, kind: PayoutKind) -> Option<Payout> {
    (!amount.is_zero()).then_some(Payout {
        recipient,
        amount,
        kind,
    })
}

/// Payouts for an undisputed proposal that outlived its window.
pub fn expiry_payouts<V>(proposal: &Proposal<V>, reward: Amount) -> Result<Vec<Payout>, CoreError> {
    Ok([
        payout(proposal.proposer, proposal.stake()?, PayoutKind::StakeReturn),
        payout(proposal.proposer, reward, PayoutKind::Reward),
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Payouts for a dispute branch once the arbitrator has answered.
///
/// `reward` is zero for superseded branches and for requests whose reward
/// was refunded at dispute time.
pub fn dispute_payouts<V>(
    proposal: &Proposal<V>,
    disputer: Address,
    proposer_won: bool,
    reward: Amount,
    fee_sink: Address,
) -> Result<Vec<Payout>, CoreError> {
    let winner = if proposer_won {
        proposal.proposer
    } else {
        disputer
    };
    let burned = proposal.bond.half_floor();
    let share = proposal.bond.half_ceil();
    let sink = proposal.final_fee.checked_add(burned)?;
    Ok([
        payout(winner, proposal.stake()?, PayoutKind::StakeReturn),
        payout(winner, share, PayoutKind::BondShare),
        payout(winner, reward, PayoutKind::Reward),
        payout(fee_sink, sink, PayoutKind::FeeSink),
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Total of a payout list.
pub fn total(payouts: &[Payout]) -> Result<Amount, CoreError> {
    Amount::checked_sum(payouts.iter().map(|p| p.amount))
}

/// The escrow batch executing `payouts` for `request`.
pub fn to_batch(request: RequestId, currency: &Currency, payouts: &[Payout]) -> TransferBatch {
    payouts
        .iter()
        .fold(TransferBatch::new(request, currency.clone()), |batch, p| {
            batch.push(p.recipient, p.amount)
        })
}
