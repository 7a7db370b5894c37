//! # Questions
//!
//! What the arbitrator is asked: a topic, the instant it refers to, and the
//! requester-stamped ancillary data. Questions are plain values; two equal
//! questions are the same question to the arbitrator.

use serde::{Deserialize, Serialize};

use optimist_core::{AncillaryData, Identifier, Timestamp};

/// A question escalated to the arbitrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    /// Topic of the question.
    pub identifier: Identifier,
    /// Request timestamp, or the proposal time for event-based requests.
    pub timestamp: Timestamp,
    /// Ancillary data with the requester stamp.
    pub ancillary_data: AncillaryData,
}

impl Question {
    /// Assemble a question.
    pub fn new(identifier: Identifier, timestamp: Timestamp, ancillary_data: AncillaryData) -> Self {
        Self {
            identifier,
            timestamp,
            ancillary_data,
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{} ({} bytes ancillary)",
            self.identifier,
            self.timestamp,
            self.ancillary_data.len()
        )
    }
}
