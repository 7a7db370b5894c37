//! # In-Memory Arbitrator
//!
//! Records questions, lets a test or simulation answer them, and broadcasts
//! each answer to subscribers. Questions are kept in submission order so
//! [`InMemoryArbitrator::pending`] lists them the way a voter queue would.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::bridge::ArbitratorBridge;
use crate::error::ArbitrationError;
use crate::question::Question;

/// Capacity of the answer broadcast channel. Slow subscribers see
/// `RecvError::Lagged` rather than blocking answers.
const ANSWER_CHANNEL_CAPACITY: usize = 256;

/// A question together with its final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion<V> {
    /// The question that was resolved.
    pub question: Question,
    /// The arbitrator's answer.
    pub answer: V,
}

#[derive(Debug)]
struct ArbitratorState<V> {
    order: Vec<Question>,
    answers: HashMap<Question, Option<V>>,
    outage: Option<String>,
}

/// Process-local arbitrator.
#[derive(Debug)]
pub struct InMemoryArbitrator<V> {
    state: Mutex<ArbitratorState<V>>,
    answers_tx: broadcast::Sender<AnsweredQuestion<V>>,
}

impl<V: Clone> InMemoryArbitrator<V> {
    /// An arbitrator with no questions.
    pub fn new() -> Self {
        let (answers_tx, _) = broadcast::channel(ANSWER_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(ArbitratorState {
                order: Vec::new(),
                answers: HashMap::new(),
                outage: None,
            }),
            answers_tx,
        }
    }

    /// Resolve `question` with `answer` and notify subscribers.
    pub fn push_answer(&self, question: &Question, answer: V) -> Result<(), ArbitrationError> {
        {
            let mut state = self.state.lock();
            let slot = state
                .answers
                .get_mut(question)
                .ok_or_else(|| ArbitrationError::UnknownQuestion {
                    question: question.to_string(),
                })?;
            if slot.is_some() {
                return Err(ArbitrationError::AlreadyAnswered {
                    question: question.to_string(),
                });
            }
            *slot = Some(answer.clone());
        }
        tracing::info!(question = %question, "arbitrator answered question");
        // No subscribers is fine.
        let _ = self.answers_tx.send(AnsweredQuestion {
            question: question.clone(),
            answer,
        });
        Ok(())
    }

    /// Questions still awaiting an answer, oldest first.
    pub fn pending(&self) -> Vec<Question> {
        let state = self.state.lock();
        state
            .order
            .iter()
            .filter(|q| matches!(state.answers.get(*q), Some(None)))
            .cloned()
            .collect()
    }

    /// Every question ever submitted, oldest first.
    pub fn questions(&self) -> Vec<Question> {
        self.state.lock().order.clone()
    }

    /// Receive every answer pushed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AnsweredQuestion<V>> {
        self.answers_tx.subscribe()
    }

    /// Simulate an outage: while set, every bridge call fails with
    /// [`ArbitrationError::Unavailable`]. `None` restores service.
    pub fn set_outage(&self, reason: Option<String>) {
        self.state.lock().outage = reason;
    }
}

impl<V: Clone> Default for InMemoryArbitrator<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_outage<V>(state: &ArbitratorState<V>) -> Result<(), ArbitrationError> {
    match &state.outage {
        Some(reason) => Err(ArbitrationError::Unavailable {
            reason: reason.clone(),
        }),
        None => Ok(()),
    }
}

impl<V: Clone + Send + Sync> ArbitratorBridge<V> for InMemoryArbitrator<V> {
    fn submit_question(&self, question: &Question) -> Result<(), ArbitrationError> {
        let mut state = self.state.lock();
        check_outage(&state)?;
        if state.answers.contains_key(question) {
            tracing::debug!(question = %question, "question already submitted");
            return Ok(());
        }
        state.answers.insert(question.clone(), None);
        state.order.push(question.clone());
        tracing::info!(question = %question, "question submitted to arbitrator");
        Ok(())
    }

    fn get_answer(&self, question: &Question) -> Result<Option<V>, ArbitrationError> {
        let state = self.state.lock();
        check_outage(&state)?;
        Ok(state.answers.get(question).cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimist_core::{AncillaryData, Identifier, Timestamp};

    fn question(n: i64) -> Question {
        Question::new(
            Identifier::new("YES_OR_NO_QUERY").unwrap(),
            Timestamp::from_epoch_secs(n).unwrap(),
            AncillaryData::from("q:test"),
        )
    }

    #[test]
    fn unanswered_question_has_no_answer() {
        let arb = InMemoryArbitrator::<i128>::new();
        arb.submit_question(&question(1)).unwrap();
        assert!(!arb.has_answer(&question(1)).unwrap());
        assert_eq!(arb.get_answer(&question(1)).unwrap(), None);
    }

    #[test]
    fn unknown_question_has_no_answer() {
        let arb = InMemoryArbitrator::<i128>::new();
        assert!(!arb.has_answer(&question(1)).unwrap());
    }

    #[test]
    fn pushed_answer_is_visible() {
        let arb = InMemoryArbitrator::<i128>::new();
        arb.submit_question(&question(1)).unwrap();
        arb.push_answer(&question(1), 42).unwrap();
        assert!(arb.has_answer(&question(1)).unwrap());
        assert_eq!(arb.get_answer(&question(1)).unwrap(), Some(42));
    }

    #[test]
    fn submission_is_idempotent() {
        let arb = InMemoryArbitrator::<i128>::new();
        arb.submit_question(&question(1)).unwrap();
        arb.submit_question(&question(1)).unwrap();
        assert_eq!(arb.questions().len(), 1);
    }

    #[test]
    fn resubmission_keeps_existing_answer() {
        let arb = InMemoryArbitrator::<i128>::new();
        arb.submit_question(&question(1)).unwrap();
        arb.push_answer(&question(1), 7).unwrap();
        arb.submit_question(&question(1)).unwrap();
        assert_eq!(arb.get_answer(&question(1)).unwrap(), Some(7));
    }

    #[test]
    fn answering_unknown_question_fails() {
        let arb = InMemoryArbitrator::<i128>::new();
        let err = arb.push_answer(&question(9), 1).unwrap_err();
        assert!(matches!(err, ArbitrationError::UnknownQuestion { .. }));
    }

    #[test]
    fn answers_are_final() {
        let arb = InMemoryArbitrator::<i128>::new();
        arb.submit_question(&question(1)).unwrap();
        arb.push_answer(&question(1), 1).unwrap();
        let err = arb.push_answer(&question(1), 2).unwrap_err();
        assert!(matches!(err, ArbitrationError::AlreadyAnswered { .. }));
        assert_eq!(arb.get_answer(&question(1)).unwrap(), Some(1));
    }

    #[test]
    fn pending_lists_unanswered_in_order() {
        let arb = InMemoryArbitrator::<i128>::new();
        for n in 1..=3 {
            arb.submit_question(&question(n)).unwrap();
        }
        arb.push_answer(&question(2), 0).unwrap();
        assert_eq!(arb.pending(), vec![question(1), question(3)]);
    }

    #[test]
    fn outage_fails_every_call() {
        let arb = InMemoryArbitrator::<i128>::new();
        arb.set_outage(Some("maintenance".to_string()));
        assert!(matches!(
            arb.submit_question(&question(1)),
            Err(ArbitrationError::Unavailable { .. })
        ));
        assert!(arb.has_answer(&question(1)).is_err());
        arb.set_outage(None);
        arb.submit_question(&question(1)).unwrap();
    }

    #[tokio::test]
    async fn subscribers_receive_answers() {
        let arb = InMemoryArbitrator::<i128>::new();
        let mut rx = arb.subscribe();
        arb.submit_question(&question(1)).unwrap();
        arb.push_answer(&question(1), 99).unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(got.question, question(1));
        assert_eq!(got.answer, 99);
    }

    #[test]
    fn question_display_mentions_topic_and_time() {
        let s = question(0).to_string();
        assert!(s.starts_with("YES_OR_NO_QUERY@1970-01-01T00:00:00Z"));
    }
}
