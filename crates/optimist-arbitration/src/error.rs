//! # Arbitration Error Types

use thiserror::Error;

/// Errors from the arbitrator bridge. Absence of an answer is not one of
/// them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrationError {
    /// An answer was pushed for a question nobody asked.
    #[error("unknown question {question}")]
    UnknownQuestion {
        /// Display form of the question.
        question: String,
    },

    /// The question already carries a final answer.
    #[error("question {question} is already answered")]
    AlreadyAnswered {
        /// Display form of the question.
        question: String,
    },

    /// The arbitrator could not be reached or rejected the call.
    #[error("arbitrator unavailable: {reason}")]
    Unavailable {
        /// Transport or backend failure description.
        reason: String,
    },
}
