//! # Request State
//!
//! Status machine:
//!
//! ```text
//! Invalid → Requested → Proposed ─┬─(liveness elapses)──→ Expired ──→ Settled
//!                                 └─(dispute)──→ Disputed ─(answer)─→ Resolved ──→ Settled
//!                                                 └─(re-proposal)──→ Proposed
//! ```
//!
//! The state is never stored. [`RequestState::derive`] recomputes it from the
//! record, the clock and the arbitrator, so a stored flag can never disagree
//! with the passage of time or an answer that arrived in the meantime.

use serde::{Deserialize, Serialize};

use optimist_arbitration::{ArbitrationError, Question};
use optimist_core::Timestamp;

use crate::liveness;
use crate::request::RequestRecord;

/// The derived state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    /// No such request.
    Invalid,
    /// Created, awaiting a proposal.
    Requested,
    /// A proposal is inside its dispute window.
    Proposed,
    /// A proposal outlived its window undisputed; settleable.
    Expired,
    /// The authoritative dispute awaits the arbitrator.
    Disputed,
    /// The arbitrator has answered; settleable.
    Resolved,
    /// Finalized. Terminal.
    Settled,
}

impl RequestState {
    /// Derive the state of `record` at `now`. `has_answer` is consulted only
    /// when an authoritative dispute exists.
    pub fn derive<V>(
        record: Option<&RequestRecord<V>>,
        now: Timestamp,
        has_answer: impl FnOnce(&Question) -> Result<bool, ArbitrationError>,
    ) -> Result<Self, ArbitrationError> {
        let Some(record) = record else {
            return Ok(Self::Invalid);
        };
        if record.settlement.is_some() {
            return Ok(Self::Settled);
        }
        if let Some(live) = &record.live {
            return Ok(if liveness::is_disputable(now, live.expiry) {
                Self::Proposed
            } else {
                Self::Expired
            });
        }
        if let Some(head) = record.authoritative_dispute() {
            return Ok(if has_answer(&head.question)? {
                Self::Resolved
            } else {
                Self::Disputed
            });
        }
        Ok(Self::Requested)
    }

    /// Whether a value is available (settled or settleable).
    pub fn has_value(&self) -> bool {
        matches!(self, Self::Expired | Self::Resolved | Self::Settled)
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Requested => "REQUESTED",
            Self::Proposed => "PROPOSED",
            Self::Expired => "EXPIRED",
            Self::Disputed => "DISPUTED",
            Self::Resolved => "RESOLVED",
            Self::Settled => "SETTLED",
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
