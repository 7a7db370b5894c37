//! # Scenario replay
//!
//! `optimist simulate <scenario>` wires an [`OptimisticOracle`] over
//! [`InMemoryLedger`], [`InMemoryArbitrator`] and a [`ManualClock`], runs
//! every step, and prints a JSON report. The exit code is 0 when every step
//! matched its expectation.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use optimist_arbitration::InMemoryArbitrator;
use optimist_core::{Address, Amount, AncillaryData, Clock, ManualClock, RequestKey};
use optimist_escrow::{EscrowLedger, InMemoryLedger};
use optimist_oracle::{
    AllowAllTopics, IdentifierWhitelist, OptimisticOracle, OracleConfig, OracleError,
    TopicValidator,
};

use crate::scenario::{Action, Expectation, Scenario};

/// Arguments for `optimist simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file (YAML).
    pub scenario: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Position in the scenario.
    pub index: usize,
    /// Action name.
    pub action: &'static str,
    /// Whether the oracle accepted the call.
    pub succeeded: bool,
    /// Whether that matched the step's expectation.
    pub as_expected: bool,
    /// Receipt summary or error message.
    pub detail: String,
}

/// Final view of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestReport {
    /// Scenario-local name.
    pub name: String,
    /// Request id.
    pub id: String,
    /// Derived state after the last step.
    pub state: String,
    /// Settled value, if any.
    pub value: Option<String>,
    /// Number of disputes raised.
    pub disputes: usize,
    /// Value still escrowed for the request.
    pub escrowed: Amount,
}

/// Full replay report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Every step matched its expectation.
    pub passed: bool,
    /// Clock time after the last step.
    pub finished_at: String,
    /// Per-step outcomes.
    pub steps: Vec<StepReport>,
    /// Per-request summaries, in creation order.
    pub requests: Vec<RequestReport>,
    /// Final balances of every funded party and the fee sink.
    pub balances: BTreeMap<Address, Amount>,
}

/// Execute the simulate subcommand. `config` overrides the scenario's own.
pub fn run_simulate(args: &SimulateArgs, config: Option<&PathBuf>) -> Result<u8> {
    let scenario = Scenario::from_yaml_file(&args.scenario)?;
    let config = match config {
        Some(path) => OracleConfig::from_yaml_file(path)
            .with_context(|| format!("invalid configuration: {}", path.display()))?,
        None => scenario
            .config
            .clone()
            .context("scenario has no `config` and --config was not given")?,
    };

    let report = simulate(&scenario, config)?;
    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            println!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(if report.passed { 0 } else { 1 })
}

/// Replay `scenario` under `config`.
pub fn simulate(scenario: &Scenario, config: OracleConfig) -> Result<Report> {
    let mut runner = Runner::new(scenario, config)?;
    let mut steps = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = runner.execute(&step.action)?;
        let succeeded = outcome.is_ok();
        let as_expected = succeeded == (step.expect == Expectation::Ok);
        let detail = match outcome {
            Ok(detail) => detail,
            Err(e) => e.to_string(),
        };
        if as_expected {
            tracing::debug!(index, action = step.action.name(), %detail, "step ok");
        } else {
            tracing::warn!(index, action = step.action.name(), %detail, "step did not match expectation");
        }
        steps.push(StepReport {
            index,
            action: step.action.name(),
            succeeded,
            as_expected,
            detail,
        });
    }

    runner.report(steps)
}

struct Runner {
    clock: ManualClock,
    ledger: Arc<InMemoryLedger>,
    arbitrator: Arc<InMemoryArbitrator<i128>>,
    oracle: OptimisticOracle<i128>,
    currency: optimist_core::Currency,
    parties: Vec<Address>,
    names: Vec<String>,
    keys: HashMap<String, RequestKey>,
}

impl Runner {
    fn new(scenario: &Scenario, config: OracleConfig) -> Result<Self> {
        let clock = ManualClock::new(scenario.start);
        let ledger = Arc::new(InMemoryLedger::new());
        for (party, amount) in &scenario.funds {
            ledger.mint(*party, &scenario.currency, *amount)?;
            ledger.approve(*party, &scenario.currency, Amount::MAX);
        }
        let arbitrator = Arc::new(InMemoryArbitrator::new());
        let topics: Arc<dyn TopicValidator> = match &scenario.identifiers {
            Some(ids) => Arc::new(IdentifierWhitelist::new(ids.iter().cloned())),
            None => Arc::new(AllowAllTopics),
        };

        let mut parties: Vec<Address> = scenario.funds.keys().copied().collect();
        if !parties.contains(&config.fee_sink) {
            parties.push(config.fee_sink);
        }

        let oracle = OptimisticOracle::new(
            config,
            Arc::new(clock.clone()),
            ledger.clone(),
            arbitrator.clone(),
            topics,
        )?;
        Ok(Self {
            clock,
            ledger,
            arbitrator,
            oracle,
            currency: scenario.currency.clone(),
            parties,
            names: Vec::new(),
            keys: HashMap::new(),
        })
    }

    fn key(&self, name: &str) -> Result<&RequestKey> {
        self.keys
            .get(name)
            .with_context(|| format!("scenario refers to unknown request `{name}`"))
    }

    /// Outer error: the scenario itself is broken. Inner error: the oracle
    /// rejected the call.
    fn execute(&mut self, action: &Action) -> Result<Result<String, OracleError>> {
        let outcome = match action {
            Action::Request {
                name,
                requester,
                identifier,
                timestamp,
                ancillary,
                reward,
            } => {
                if self.keys.contains_key(name) {
                    bail!("request name `{name}` is used twice");
                }
                let key = RequestKey::new(
                    *requester,
                    identifier.clone(),
                    timestamp.unwrap_or_else(|| self.clock.now()),
                    AncillaryData::from(ancillary.as_str()),
                );
                let outcome = self
                    .oracle
                    .create_request(key.clone(), self.currency.clone(), *reward);
                if outcome.is_ok() {
                    self.names.push(name.clone());
                    self.keys.insert(name.clone(), key);
                }
                outcome.map(|id| id.to_string())
            }
            Action::SetBond { request, bond } => {
                let key = self.key(request)?;
                self.oracle
                    .set_bond(&key.requester, key, *bond)
                    .map(|()| format!("bond {bond}"))
            }
            Action::SetLiveness { request, secs } => {
                let key = self.key(request)?;
                self.oracle
                    .set_custom_liveness(&key.requester, key, *secs)
                    .map(|()| format!("liveness {secs}s"))
            }
            Action::SetRefundOnDispute { request } => {
                let key = self.key(request)?;
                self.oracle
                    .set_refund_on_dispute(&key.requester, key)
                    .map(|()| "refund on dispute".to_string())
            }
            Action::SetEventBased { request } => {
                let key = self.key(request)?;
                self.oracle
                    .set_event_based(&key.requester, key)
                    .map(|()| "event based".to_string())
            }
            Action::SetCallbacks { request, callbacks } => {
                let key = self.key(request)?;
                self.oracle
                    .set_callbacks(&key.requester, key, *callbacks)
                    .map(|()| format!("{callbacks:?}"))
            }
            Action::Propose {
                request,
                proposer,
                payer,
                value,
                bond,
            } => {
                let key = self.key(request)?;
                self.oracle
                    .propose_for(payer.unwrap_or(*proposer), *proposer, key, *value, *bond)
                    .map(|r| format!("bond {} expires {}", r.bond, r.expiry))
            }
            Action::Dispute {
                request,
                disputer,
                payer,
            } => {
                let key = self.key(request)?;
                self.oracle
                    .dispute_for(payer.unwrap_or(*disputer), *disputer, key)
                    .map(|r| format!("{} refund {}", r.dispute, r.refund))
            }
            Action::Advance { secs } => {
                let now = self.clock.advance(*secs)?;
                Ok(format!("now {now}"))
            }
            Action::Answer { request, value } => {
                let key = self.key(request)?;
                let record = self
                    .oracle
                    .get_request(key)?
                    .with_context(|| format!("request `{request}` was never created"))?;
                let dispute = record
                    .disputes
                    .last()
                    .with_context(|| format!("request `{request}` has no dispute to answer"))?;
                self.arbitrator
                    .push_answer(&dispute.question, *value)
                    .map(|()| format!("{} answered {value}", dispute.id))
                    .map_err(OracleError::from)
            }
            Action::Settle { request } => {
                let key = self.key(request)?;
                self.oracle
                    .settle(key)
                    .map(|r| format!("{} value {}", r.resolution, r.value))
            }
            Action::SettleDispute { request, dispute } => {
                let key = self.key(request)?;
                let record = self
                    .oracle
                    .get_request(key)?
                    .with_context(|| format!("request `{request}` was never created"))?;
                let id = record.disputes.get(*dispute).map(|d| d.id).with_context(|| {
                    format!("request `{request}` has no dispute at index {dispute}")
                })?;
                self.oracle
                    .settle_dispute(key, id)
                    .map(|r| format!("{} proposer won: {}", r.dispute, r.proposer_won))
            }
        };
        Ok(outcome)
    }

    fn report(&self, steps: Vec<StepReport>) -> Result<Report> {
        let mut requests = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let key = self.key(name)?;
            let state = self.oracle.get_state(key)?;
            let record = self
                .oracle
                .get_request(key)?
                .with_context(|| format!("request `{name}` vanished"))?;
            requests.push(RequestReport {
                name: name.clone(),
                id: record.id.to_string(),
                state: state.to_string(),
                value: record.settlement.as_ref().map(|s| s.value.to_string()),
                disputes: record.disputes.len(),
                escrowed: self.ledger.escrowed(&record.id, &self.currency),
            });
        }
        let balances = self
            .parties
            .iter()
            .map(|p| (*p, self.ledger.balance_of(p, &self.currency)))
            .collect();
        Ok(Report {
            passed: steps.iter().all(|s| s.as_expected),
            finished_at: self.clock.now().to_string(),
            steps,
            requests,
            balances,
        })
    }
}
