//! # Optimistic Oracle
//!
//! The request store and the operations that drive it. Every mutating call
//! takes the store's write lock for its whole duration: validation, the
//! arbitrator submission, the escrow batch and the commit happen as one
//! linearized step. Notification hooks run afterwards, outside the lock.
//!
//! ## Re-proposal
//!
//! A request whose newest dispute is still unanswered accepts a fresh
//! proposal. If that proposal outlives its window, it finalizes the value.
//! The earlier dispute stays open and, once answered, settles only its own
//! bonds through [`OptimisticOracle::settle_dispute`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use optimist_arbitration::{ArbitratorBridge, Question};
use optimist_core::{Address, Amount, Clock, Currency, RequestId, RequestKey, Timestamp};
use optimist_escrow::{EscrowLedger, TransferBatch};

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::liveness;
use crate::notify::{
    deliver, CallbackOutcome, DisputeEvent, NotificationError, NotificationSink, ProposeEvent,
    SettleEvent,
};
use crate::receipt::{BranchReceipt, DisputeReceipt, ProposalReceipt, SettlementReceipt};
use crate::request::{
    BranchSettlement, CallbackFlags, Dispute, DisputeId, DisputeRecord, Proposal, RequestRecord,
    RequestSettings, Resolution, Settlement,
};
use crate::settlement;
use crate::state::RequestState;
use crate::topic::TopicValidator;
use crate::value::ProposedValue;

type SharedSink<V> = Arc<dyn NotificationSink<V>>;

/// The optimistic oracle, generic over its answer domain.
pub struct OptimisticOracle<V: ProposedValue> {
    config: OracleConfig,
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn EscrowLedger>,
    arbitrator: Arc<dyn ArbitratorBridge<V>>,
    topics: Arc<dyn TopicValidator>,
    requests: RwLock<HashMap<RequestId, RequestRecord<V>>>,
    sinks: RwLock<HashMap<Address, SharedSink<V>>>,
}

impl<V: ProposedValue> std::fmt::Debug for OptimisticOracle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticOracle")
            .field("config", &self.config)
            .field("requests", &self.requests.read().len())
            .field("sinks", &self.sinks.read().len())
            .finish()
    }
}

impl<V: ProposedValue> OptimisticOracle<V> {
    /// Wire an oracle to its collaborators. Fails if `config` is invalid.
    pub fn new(
        config: OracleConfig,
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn EscrowLedger>,
        arbitrator: Arc<dyn ArbitratorBridge<V>>,
        topics: Arc<dyn TopicValidator>,
    ) -> Result<Self, OracleError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            ledger,
            arbitrator,
            topics,
            requests: RwLock::new(HashMap::new()),
            sinks: RwLock::new(HashMap::new()),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    // ── Notification sinks ─────────────────────────────────────────────

    /// Register the sink notified for every request opened by `requester`.
    /// Replaces and returns any previous sink.
    pub fn register_sink(&self, requester: Address, sink: SharedSink<V>) -> Option<SharedSink<V>> {
        self.sinks.write().insert(requester, sink)
    }

    /// Remove `requester`'s sink.
    pub fn unregister_sink(&self, requester: &Address) -> bool {
        self.sinks.write().remove(requester).is_some()
    }

    fn notify(
        &self,
        requester: &Address,
        enabled: bool,
        hook: &str,
        f: impl FnOnce(&(dyn NotificationSink<V> + 'static)) -> Result<(), NotificationError>,
    ) -> CallbackOutcome {
        let sink = if enabled {
            self.sinks.read().get(requester).cloned()
        } else {
            None
        };
        deliver::<V, dyn NotificationSink<V>, _>(sink.as_deref(), enabled, hook, f)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    fn derive_state(
        &self,
        record: Option<&RequestRecord<V>>,
        now: Timestamp,
    ) -> Result<RequestState, OracleError> {
        Ok(RequestState::derive(record, now, |q| {
            self.arbitrator.has_answer(q)
        })?)
    }

    /// Current state of `key`; `Invalid` if it was never requested.
    pub fn get_state(&self, key: &RequestKey) -> Result<RequestState, OracleError> {
        let id = key.id()?;
        let now = self.clock.now();
        let requests = self.requests.read();
        let state = self.derive_state(requests.get(&id), now)?;
        tracing::debug!(request = %id, state = %state, "state derived");
        Ok(state)
    }

    /// Whether a value is settled or ready to settle.
    pub fn has_value(&self, key: &RequestKey) -> Result<bool, OracleError> {
        Ok(self.get_state(key)?.has_value())
    }

    /// Snapshot of the stored record.
    pub fn get_request(&self, key: &RequestKey) -> Result<Option<RequestRecord<V>>, OracleError> {
        let id = key.id()?;
        Ok(self.requests.read().get(&id).cloned())
    }

    /// Snapshot of every record.
    pub fn requests(&self) -> Vec<RequestRecord<V>> {
        self.requests.read().values().cloned().collect()
    }

    // ── Requests ───────────────────────────────────────────────────────

    /// Open a request and escrow its reward from the key's requester.
    pub fn create_request(
        &self,
        key: RequestKey,
        currency: Currency,
        reward: Amount,
    ) -> Result<RequestId, OracleError> {
        let id = key.id()?;
        let now = self.clock.now();
        let mut requests = self.requests.write();

        if requests.contains_key(&id) {
            return Err(OracleError::DuplicateRequest {
                request: id.to_string(),
            });
        }
        if !self.topics.is_supported(&key.identifier) {
            return Err(OracleError::UnsupportedTopic {
                identifier: key.identifier.to_string(),
            });
        }
        let final_fee =
            self.config
                .final_fee(&currency)
                .ok_or_else(|| OracleError::UnsupportedCurrency {
                    currency: currency.to_string(),
                })?;
        if key.timestamp > now {
            return Err(OracleError::FutureTimestamp {
                timestamp: key.timestamp.to_string(),
                now: now.to_string(),
            });
        }
        let stamped = key.stamped_ancillary_data();
        if stamped.len() > self.config.max_ancillary_data_len {
            return Err(OracleError::AncillaryDataTooLong {
                len: stamped.len(),
                max: self.config.max_ancillary_data_len,
            });
        }
        let default_bond = self
            .config
            .default_bond_percentage
            .mul_amount_floor(final_fee)?;

        self.ledger
            .execute(&TransferBatch::new(id, currency.clone()).pull(key.requester, reward))?;

        tracing::info!(
            request = %id,
            requester = %key.requester,
            identifier = %key.identifier,
            currency = %currency,
            reward = %reward,
            "request created"
        );
        requests.insert(
            id,
            RequestRecord {
                key,
                id,
                currency,
                reward,
                reward_outstanding: reward,
                final_fee,
                default_bond,
                created_at: now,
                stamped_ancillary_data: stamped,
                settings: RequestSettings::default(),
                live: None,
                disputes: Vec::new(),
                settlement: None,
            },
        );
        Ok(id)
    }

    /// Fails the way the ledger would if `payer` cannot fund `amount`, so a
    /// dispute that cannot be paid for never reaches the arbitrator.
    fn ensure_can_pay(
        &self,
        payer: &Address,
        currency: &Currency,
        amount: Amount,
    ) -> Result<(), OracleError> {
        let approved = self.ledger.allowance(payer, currency);
        if approved < amount {
            return Err(OracleError::InsufficientAllowance {
                owner: payer.to_string(),
                currency: currency.to_string(),
                required: amount,
                approved,
            });
        }
        let available = self.ledger.balance_of(payer, currency);
        if available < amount {
            return Err(OracleError::InsufficientFunds {
                holder: payer.to_string(),
                currency: currency.to_string(),
                required: amount,
                available,
            });
        }
        Ok(())
    }

    fn update_settings(
        &self,
        caller: &Address,
        key: &RequestKey,
        setting: &str,
        f: impl FnOnce(&mut RequestSettings) -> Result<(), OracleError>,
    ) -> Result<(), OracleError> {
        let id = key.id()?;
        let now = self.clock.now();
        let mut requests = self.requests.write();
        let record = requests
            .get_mut(&id)
            .ok_or_else(|| OracleError::UnknownRequest {
                request: id.to_string(),
            })?;
        if caller != &key.requester {
            return Err(OracleError::NotRequester {
                request: id.to_string(),
                caller: caller.to_string(),
            });
        }
        let state = self.derive_state(Some(&*record), now)?;
        if state != RequestState::Requested {
            return Err(OracleError::SettingsLocked {
                request: id.to_string(),
                state: state.to_string(),
            });
        }
        f(&mut record.settings)?;
        tracing::info!(request = %id, setting, "request setting changed");
        Ok(())
    }

    /// Replace the default bond for proposals on `key`.
    pub fn set_bond(
        &self,
        caller: &Address,
        key: &RequestKey,
        bond: Amount,
    ) -> Result<(), OracleError> {
        self.update_settings(caller, key, "bond", |s| {
            s.custom_bond = Some(bond);
            Ok(())
        })
    }

    /// Replace the default liveness for proposals on `key`.
    pub fn set_custom_liveness(
        &self,
        caller: &Address,
        key: &RequestKey,
        liveness_secs: u64,
    ) -> Result<(), OracleError> {
        let liveness_secs = liveness::validate(liveness_secs)?;
        self.update_settings(caller, key, "custom_liveness", |s| {
            s.custom_liveness_secs = Some(liveness_secs);
            Ok(())
        })
    }

    /// Return the reward to the requester when the first dispute lands.
    pub fn set_refund_on_dispute(
        &self,
        caller: &Address,
        key: &RequestKey,
    ) -> Result<(), OracleError> {
        self.update_settings(caller, key, "refund_on_dispute", |s| {
            s.refund_on_dispute = true;
            Ok(())
        })
    }

    /// Mark `key` as asking about an event. Implies refund-on-dispute,
    /// rejects "too early" proposals, and dates arbitrator questions at the
    /// disputed proposal's time instead of the request timestamp.
    pub fn set_event_based(&self, caller: &Address, key: &RequestKey) -> Result<(), OracleError> {
        self.update_settings(caller, key, "event_based", |s| {
            s.event_based = true;
            s.refund_on_dispute = true;
            Ok(())
        })
    }

    /// Choose which notification hooks fire for `key`.
    pub fn set_callbacks(
        &self,
        caller: &Address,
        key: &RequestKey,
        flags: CallbackFlags,
    ) -> Result<(), OracleError> {
        self.update_settings(caller, key, "callbacks", |s| {
            s.callbacks = flags;
            Ok(())
        })
    }

    // ── Proposals ──────────────────────────────────────────────────────

    /// Propose `value`, paying and benefiting as `proposer`.
    pub fn propose(
        &self,
        proposer: Address,
        key: &RequestKey,
        value: V,
        bond_override: Option<Amount>,
    ) -> Result<ProposalReceipt, OracleError> {
        self.propose_for(proposer, proposer, key, value, bond_override)
    }

    /// Propose `value`: `caller` stakes bond plus final fee, `beneficiary`
    /// is recorded as proposer and receives any payout.
    pub fn propose_for(
        &self,
        caller: Address,
        beneficiary: Address,
        key: &RequestKey,
        value: V,
        bond_override: Option<Amount>,
    ) -> Result<ProposalReceipt, OracleError> {
        if beneficiary.is_zero() {
            return Err(OracleError::ZeroAddressTarget {
                operation: "propose".to_string(),
            });
        }
        let id = key.id()?;
        let now = self.clock.now();

        let (bond, final_fee, expiry, enabled) = {
            let mut requests = self.requests.write();
            let record = requests
                .get_mut(&id)
                .ok_or_else(|| OracleError::UnknownRequest {
                    request: id.to_string(),
                })?;
            let state = self.derive_state(Some(&*record), now)?;
            if !matches!(state, RequestState::Requested | RequestState::Disputed) {
                return Err(OracleError::ProposalNotAllowed {
                    request: id.to_string(),
                    state: state.to_string(),
                });
            }
            if record.settings.event_based && value.is_too_early() {
                return Err(OracleError::InvalidProposedValue {
                    request: id.to_string(),
                    reason: "event-based requests cannot be answered as too early".to_string(),
                });
            }

            let bond = bond_override.unwrap_or_else(|| record.effective_bond());
            let final_fee = record.final_fee;
            let stake = bond.checked_add(final_fee)?;
            let liveness_secs = record.liveness_secs(self.config.default_liveness_secs);
            let expiry =
                liveness::expiry(now, liveness_secs).ok_or_else(|| OracleError::Overflow {
                    operation: "proposal expiry".to_string(),
                })?;

            self.ledger
                .execute(&TransferBatch::new(id, record.currency.clone()).pull(caller, stake))?;

            record.live = Some(Proposal {
                proposer: beneficiary,
                value: value.clone(),
                proposal_time: now,
                expiry,
                bond,
                final_fee,
            });
            tracing::info!(
                request = %id,
                proposer = %beneficiary,
                payer = %caller,
                value = ?value,
                bond = %bond,
                final_fee = %final_fee,
                expiry = %expiry,
                after_dispute = state == RequestState::Disputed,
                "proposal committed"
            );
            (bond, final_fee, expiry, record.settings.callbacks.on_propose)
        };

        let callback = self.notify(&key.requester, enabled, "on_propose", |sink| {
            sink.on_propose(&ProposeEvent {
                key: key.clone(),
                proposer: beneficiary,
                value,
            })
        });
        Ok(ProposalReceipt {
            request: id,
            proposer: beneficiary,
            bond,
            final_fee,
            expiry,
            callback,
        })
    }

    // ── Disputes ───────────────────────────────────────────────────────

    /// Dispute the live proposal, paying and benefiting as `disputer`.
    pub fn dispute(&self, disputer: Address, key: &RequestKey) -> Result<DisputeReceipt, OracleError> {
        self.dispute_for(disputer, disputer, key)
    }

    /// Dispute the live proposal: `caller` stakes a matching bond plus final
    /// fee, `beneficiary` is recorded as disputer. The caller's balance and
    /// allowance are checked before the question is submitted; submission is
    /// idempotent, so a retry after a ledger failure asks nothing new.
    pub fn dispute_for(
        &self,
        caller: Address,
        beneficiary: Address,
        key: &RequestKey,
    ) -> Result<DisputeReceipt, OracleError> {
        if beneficiary.is_zero() {
            return Err(OracleError::ZeroAddressTarget {
                operation: "dispute".to_string(),
            });
        }
        let id = key.id()?;
        let now = self.clock.now();

        let (dispute_id, question, refund, proposal, enabled) = {
            let mut requests = self.requests.write();
            let record = requests
                .get_mut(&id)
                .ok_or_else(|| OracleError::UnknownRequest {
                    request: id.to_string(),
                })?;
            if record.settlement.is_some() {
                return Err(OracleError::AlreadySettled {
                    target: id.to_string(),
                });
            }
            let proposal = record
                .live
                .clone()
                .ok_or_else(|| OracleError::NoActiveProposal {
                    request: id.to_string(),
                })?;
            if !liveness::is_disputable(now, proposal.expiry) {
                return Err(OracleError::AlreadyExpired {
                    request: id.to_string(),
                    expiry: proposal.expiry.to_string(),
                    now: now.to_string(),
                });
            }

            let question_time = if record.settings.event_based {
                proposal.proposal_time
            } else {
                key.timestamp
            };
            let question = Question::new(
                key.identifier.clone(),
                question_time,
                record.stamped_ancillary_data.clone(),
            );
            let refund = if record.settings.refund_on_dispute {
                record.reward_outstanding
            } else {
                Amount::ZERO
            };
            let remaining_reward = record.reward_outstanding.checked_sub(refund)?;
            let stake = proposal.stake()?;
            self.ensure_can_pay(&caller, &record.currency, stake)?;

            self.arbitrator.submit_question(&question)?;
            let batch = TransferBatch::new(id, record.currency.clone())
                .pull(caller, stake)
                .push(key.requester, refund);
            self.ledger.execute(&batch)?;

            let dispute_id = DisputeId::new();
            record.live = None;
            record.reward_outstanding = remaining_reward;
            record.disputes.push(DisputeRecord {
                id: dispute_id,
                proposal: proposal.clone(),
                dispute: Dispute {
                    disputer: beneficiary,
                    dispute_time: now,
                },
                question: question.clone(),
                settlement: None,
            });
            tracing::info!(
                request = %id,
                dispute = %dispute_id,
                disputer = %beneficiary,
                payer = %caller,
                proposer = %proposal.proposer,
                bond = %proposal.bond,
                refund = %refund,
                "dispute committed, question escalated"
            );
            (
                dispute_id,
                question,
                refund,
                proposal,
                record.settings.callbacks.on_dispute,
            )
        };

        let callback = self.notify(&key.requester, enabled, "on_dispute", |sink| {
            sink.on_dispute(&DisputeEvent {
                key: key.clone(),
                dispute: dispute_id,
                proposer: proposal.proposer,
                disputer: beneficiary,
                value: proposal.value,
                refund,
            })
        });
        Ok(DisputeReceipt {
            request: id,
            dispute: dispute_id,
            disputer: beneficiary,
            question,
            refund,
            callback,
        })
    }

    // ── Settlement ─────────────────────────────────────────────────────

    /// Finalize `key` and pay out. Permissionless. Fails with
    /// `NotSettleable` while the proposal is live or the arbitrator has not
    /// answered, and with `AlreadySettled` on every call after the first
    /// success.
    pub fn settle(&self, key: &RequestKey) -> Result<SettlementReceipt<V>, OracleError> {
        let id = key.id()?;
        let now = self.clock.now();

        let (value, resolution, payouts, enabled) = {
            let mut requests = self.requests.write();
            let record = requests
                .get_mut(&id)
                .ok_or_else(|| OracleError::NotSettleable {
                    request: id.to_string(),
                    reason: "no such request".to_string(),
                })?;
            if record.settlement.is_some() {
                return Err(OracleError::AlreadySettled {
                    target: id.to_string(),
                });
            }

            let (value, resolution, payouts, branch) = if let Some(live) = &record.live {
                if liveness::is_disputable(now, live.expiry) {
                    return Err(OracleError::NotSettleable {
                        request: id.to_string(),
                        reason: format!("proposal is disputable until {}", live.expiry),
                    });
                }
                let payouts = settlement::expiry_payouts(live, record.reward_outstanding)?;
                (live.value.clone(), Resolution::Expired, payouts, None)
            } else if let Some(head) = record.disputes.last() {
                let answer = self.arbitrator.get_answer(&head.question)?.ok_or_else(|| {
                    OracleError::NotSettleable {
                        request: id.to_string(),
                        reason: format!("{} awaits the arbitrator", head.id),
                    }
                })?;
                let proposer_won = answer == head.proposal.value;
                let payouts = settlement::dispute_payouts(
                    &head.proposal,
                    head.dispute.disputer,
                    proposer_won,
                    record.reward_outstanding,
                    self.config.fee_sink,
                )?;
                (
                    answer.clone(),
                    Resolution::Arbitrated { dispute: head.id },
                    payouts,
                    Some((answer, proposer_won)),
                )
            } else {
                return Err(OracleError::NotSettleable {
                    request: id.to_string(),
                    reason: "no proposal".to_string(),
                });
            };

            self.ledger
                .execute(&settlement::to_batch(id, &record.currency, &payouts))?;

            if let (Some((answer, proposer_won)), Some(head)) = (branch, record.disputes.last_mut()) {
                head.settlement = Some(BranchSettlement {
                    answer,
                    proposer_won,
                    settled_at: now,
                    payouts: payouts.clone(),
                });
            }
            record.reward_outstanding = Amount::ZERO;
            record.settlement = Some(Settlement {
                value: value.clone(),
                resolution,
                settled_at: now,
                payouts: payouts.clone(),
            });
            tracing::info!(
                request = %id,
                resolution = %resolution,
                value = ?value,
                paid = payouts.len(),
                "request settled"
            );
            (value, resolution, payouts, record.settings.callbacks.on_settle)
        };

        let callback = self.notify(&key.requester, enabled, "on_settle", |sink| {
            sink.on_settle(&SettleEvent {
                key: key.clone(),
                value: value.clone(),
                resolution,
            })
        });
        Ok(SettlementReceipt {
            request: id,
            value,
            resolution,
            payouts,
            callback,
        })
    }

    /// Pay out a superseded dispute branch once its question is answered.
    /// Moves only that branch's bonds and fees; the request's value and
    /// reward are untouched.
    pub fn settle_dispute(
        &self,
        key: &RequestKey,
        dispute: DisputeId,
    ) -> Result<BranchReceipt<V>, OracleError> {
        let id = key.id()?;
        let now = self.clock.now();
        let mut requests = self.requests.write();
        let record = requests
            .get_mut(&id)
            .ok_or_else(|| OracleError::UnknownRequest {
                request: id.to_string(),
            })?;
        let index = record
            .dispute_index(&dispute)
            .ok_or_else(|| OracleError::UnknownDispute {
                request: id.to_string(),
                dispute: dispute.to_string(),
            })?;
        let branch = &record.disputes[index];
        if branch.settlement.is_some() {
            return Err(OracleError::AlreadySettled {
                target: dispute.to_string(),
            });
        }
        if !record.is_superseded(index) {
            return Err(OracleError::NotSettleable {
                request: id.to_string(),
                reason: format!("{dispute} decides the request; settle the request instead"),
            });
        }
        let answer = self.arbitrator.get_answer(&branch.question)?.ok_or_else(|| {
            OracleError::NotSettleable {
                request: id.to_string(),
                reason: format!("{dispute} awaits the arbitrator"),
            }
        })?;
        let proposer_won = answer == branch.proposal.value;
        let payouts = settlement::dispute_payouts(
            &branch.proposal,
            branch.dispute.disputer,
            proposer_won,
            Amount::ZERO,
            self.config.fee_sink,
        )?;

        self.ledger
            .execute(&settlement::to_batch(id, &record.currency, &payouts))?;

        record.disputes[index].settlement = Some(BranchSettlement {
            answer: answer.clone(),
            proposer_won,
            settled_at: now,
            payouts: payouts.clone(),
        });
        tracing::info!(
            request = %id,
            dispute = %dispute,
            proposer_won,
            answer = ?answer,
            "superseded dispute settled"
        );
        Ok(BranchReceipt {
            request: id,
            dispute,
            answer,
            proposer_won,
            payouts,
        })
    }

    /// The finalized value, settling first if the request is settleable.
    pub fn settle_and_get_value(&self, key: &RequestKey) -> Result<V, OracleError> {
        match self.settle(key) {
            Ok(receipt) => Ok(receipt.value),
            Err(OracleError::AlreadySettled { target }) => {
                let id = key.id()?;
                tracing::debug!(request = %id, "already settled, reading stored value");
                self.requests
                    .read()
                    .get(&id)
                    .and_then(|r| r.settlement.as_ref().map(|s| s.value.clone()))
                    .ok_or(OracleError::AlreadySettled { target })
            }
            Err(e) => Err(e),
        }
    }
}
