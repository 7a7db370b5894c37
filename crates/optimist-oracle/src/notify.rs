//! # Notification Sink
//!
//! Requesters may register a sink to hear about proposals, disputes and
//! settlements of their requests, and enable individual hooks per request
//! via [`crate::CallbackFlags`].
//!
//! ## Security Invariant
//!
//! Hooks run after the oracle has committed the transition and released its
//! lock. A hook that returns an error or panics is reported as
//! [`CallbackOutcome::Failed`] and logged; the committed state and the value
//! already moved stay as they are.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use optimist_core::{Address, Amount, RequestKey};

use crate::request::{DisputeId, Resolution};

/// Error returned by a notification hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("notification rejected: {reason}")]
pub struct NotificationError {
    /// What went wrong on the receiving side.
    pub reason: String,
}

impl NotificationError {
    /// Construct from any message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A proposal was made.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposeEvent<V> {
    /// Request key.
    pub key: RequestKey,
    /// Beneficiary of the proposal.
    pub proposer: Address,
    /// Proposed value.
    pub value: V,
}

/// A proposal was disputed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisputeEvent<V> {
    /// Request key.
    pub key: RequestKey,
    /// New dispute.
    pub dispute: DisputeId,
    /// Proposer of the challenged value.
    pub proposer: Address,
    /// Beneficiary of the dispute.
    pub disputer: Address,
    /// The challenged value.
    pub value: V,
    /// Reward returned to the requester by this dispute; zero unless
    /// refund-on-dispute is set.
    pub refund: Amount,
}

/// A request was settled.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleEvent<V> {
    /// Request key.
    pub key: RequestKey,
    /// Finalized value.
    pub value: V,
    /// How it was finalized.
    pub resolution: Resolution,
}

/// Receives lifecycle notifications for a requester's requests. Every hook
/// defaults to a no-op.
pub trait NotificationSink<V>: Send + Sync {
    /// Called after a proposal is committed.
    fn on_propose(&self, _event: &ProposeEvent<V>) -> Result<(), NotificationError> {
        Ok(())
    }

    /// Called after a dispute is committed.
    fn on_dispute(&self, _event: &DisputeEvent<V>) -> Result<(), NotificationError> {
        Ok(())
    }

    /// Called after settlement is committed.
    fn on_settle(&self, _event: &SettleEvent<V>) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// What happened when a hook was due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackOutcome {
    /// The requester has no sink.
    NotRegistered,
    /// The hook is disabled for this request.
    Disabled,
    /// The hook ran and returned `Ok`.
    Delivered,
    /// The hook returned an error or panicked.
    Failed {
        /// Error or panic message.
        reason: String,
    },
}

impl CallbackOutcome {
    /// Whether the hook ran successfully.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Run `hook` against `sink`, isolating errors and panics.
pub(crate) fn deliver<V, S, F>(sink: Option<&S>, enabled: bool, name: &str, hook: F) -> CallbackOutcome
where
    S: NotificationSink<V> + ?Sized,
    F: FnOnce(&S) -> Result<(), NotificationError>,
{
    if !enabled {
        return CallbackOutcome::Disabled;
    }
    let Some(sink) = sink else {
        return CallbackOutcome::NotRegistered;
    };
    let outcome = match catch_unwind(AssertUnwindSafe(|| hook(sink))) {
        Ok(Ok(())) => CallbackOutcome::Delivered,
        Ok(Err(e)) => CallbackOutcome::Failed { reason: e.reason },
        Err(panic) => CallbackOutcome::Failed {
            reason: panic_message(panic.as_ref()),
        },
    };
    if let CallbackOutcome::Failed { reason } = &outcome {
        tracing::warn!(hook = name, reason = %reason, "notification hook failed");
    }
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
