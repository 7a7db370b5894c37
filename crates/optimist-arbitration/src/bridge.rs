//! # Arbitrator Bridge
//!
//! The poll-based contract between the oracle and its backing arbitrator.
//! Answers are in the same value domain `V` as proposals.

use crate::error::ArbitrationError;
use crate::question::Question;

/// Submit questions and poll for answers.
pub trait ArbitratorBridge<V>: Send + Sync {
    /// Ask `question`. Submitting an already-asked question is acknowledged
    /// without side effects.
    fn submit_question(&self, question: &Question) -> Result<(), ArbitrationError>;

    /// The answer, if the arbitrator has produced one.
    fn get_answer(&self, question: &Question) -> Result<Option<V>, ArbitrationError>;

    /// Whether [`get_answer`](Self::get_answer) would return a value.
    fn has_answer(&self, question: &Question) -> Result<bool, ArbitrationError> {
        Ok(self.get_answer(question)?.is_some())
    }
}
