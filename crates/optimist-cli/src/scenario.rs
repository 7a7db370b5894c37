//! # Scenario files
//!
//! A scenario is a deterministic script: a start time, an optional oracle
//! configuration, the parties' starting funds and an ordered list of steps.
//! Requests are referred to by a scenario-local name.
//!
//! ```yaml
//! start: "2026-01-01T00:00:00Z"
//! currency: USDC
//! funds:
//!   "0x0000000000000000000000000000000000000001": "1000"
//! steps:
//!   - action: request
//!     name: eth
//!     requester: "0x0000000000000000000000000000000000000001"
//!     identifier: ETH/USD
//!     reward: "5"
//!   - action: advance
//!     secs: 60
//!   - action: settle
//!     request: eth
//!     expect: error
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use optimist_core::{Address, Amount, Currency, Identifier, Timestamp};
use optimist_oracle::{CallbackFlags, OracleConfig};

/// A parsed scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Clock time before the first step.
    pub start: Timestamp,
    /// Oracle configuration; may be supplied on the command line instead.
    #[serde(default)]
    pub config: Option<OracleConfig>,
    /// Currency of every request in the scenario.
    pub currency: Currency,
    /// Starting balances. Each funded party approves the oracle without limit.
    #[serde(default)]
    pub funds: BTreeMap<Address, Amount>,
    /// Identifier whitelist. Absent means every identifier is accepted.
    #[serde(default)]
    pub identifiers: Option<Vec<Identifier>>,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse scenario")
    }

    /// Read and parse a scenario file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid scenario: {}", path.display()))
    }
}

/// Whether a step is expected to succeed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// The step must succeed.
    #[default]
    Ok,
    /// The step must fail.
    Error,
}

/// One scripted step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// What to do.
    #[serde(flatten)]
    pub action: Action,
    /// Expected outcome.
    #[serde(default)]
    pub expect: Expectation,
}

/// Scripted operations. Settings changes are made by the request's
/// requester.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Open a request.
    Request {
        /// Scenario-local name.
        name: String,
        /// Requester account.
        requester: Address,
        /// Topic.
        identifier: Identifier,
        /// Request timestamp; defaults to the current clock time.
        #[serde(default)]
        timestamp: Option<Timestamp>,
        /// Ancillary data as text.
        #[serde(default)]
        ancillary: String,
        /// Reward escrowed.
        #[serde(default)]
        reward: Amount,
    },
    /// Replace the bond.
    SetBond {
        /// Request name.
        request: String,
        /// New bond.
        bond: Amount,
    },
    /// Replace the liveness.
    SetLiveness {
        /// Request name.
        request: String,
        /// Liveness in seconds.
        secs: u64,
    },
    /// Enable refund-on-dispute.
    SetRefundOnDispute {
        /// Request name.
        request: String,
    },
    /// Mark the request event-based.
    SetEventBased {
        /// Request name.
        request: String,
    },
    /// Enable notification hooks.
    SetCallbacks {
        /// Request name.
        request: String,
        /// Hooks to enable.
        callbacks: CallbackFlags,
    },
    /// Propose a value.
    Propose {
        /// Request name.
        request: String,
        /// Beneficiary.
        proposer: Address,
        /// Paying account; defaults to the proposer.
        #[serde(default)]
        payer: Option<Address>,
        /// Proposed value.
        #[serde(deserialize_with = "deserialize_price")]
        value: i128,
        /// Per-call bond override.
        #[serde(default)]
        bond: Option<Amount>,
    },
    /// Dispute the live proposal.
    Dispute {
        /// Request name.
        request: String,
        /// Beneficiary.
        disputer: Address,
        /// Paying account; defaults to the disputer.
        #[serde(default)]
        payer: Option<Address>,
    },
    /// Move the clock forward.
    Advance {
        /// Seconds to advance.
        secs: u64,
    },
    /// Answer the request's newest dispute.
    Answer {
        /// Request name.
        request: String,
        /// Arbitrator's answer.
        #[serde(deserialize_with = "deserialize_price")]
        value: i128,
    },
    /// Settle the request.
    Settle {
        /// Request name.
        request: String,
    },
    /// Settle a superseded dispute by its position (0 = oldest).
    SettleDispute {
        /// Request name.
        request: String,
        /// Dispute index.
        dispute: usize,
    },
}

impl Action {
    /// Snake-case action name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::SetBond { .. } => "set_bond",
            Self::SetLiveness { .. } => "set_liveness",
            Self::SetRefundOnDispute { .. } => "set_refund_on_dispute",
            Self::SetEventBased { .. } => "set_event_based",
            Self::SetCallbacks { .. } => "set_callbacks",
            Self::Propose { .. } => "propose",
            Self::Dispute { .. } => "dispute",
            Self::Advance { .. } => "advance",
            Self::Answer { .. } => "answer",
            Self::Settle { .. } => "settle",
            Self::SettleDispute { .. } => "settle_dispute",
        }
    }
}

/// Prices may be written as YAML integers or, beyond the 64-bit range, as
/// decimal strings.
fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
    struct PriceVisitor;

    impl serde::de::Visitor<'_> for PriceVisitor {
        type Value = i128;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an integer or a decimal integer string")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i128, E> {
            Ok(i128::from(v))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i128, E> {
            Ok(i128::from(v))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i128, E> {
            v.trim().parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(PriceVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "start: \"2026-01-01T00:00:00Z\"\ncurrency: USDC\n";

    #[test]
    fn parses_every_action() {
        let yaml = format!(
            "{HEADER}steps:
  - action: request
    name: q
    requester: \"0x0000000000000000000000000000000000000001\"
    identifier: ETH/USD
    ancillary: \"q: close\"
    reward: 5
  - action: set_bond
    request: q
    bond: \"40\"
  - action: set_liveness
    request: q
    secs: 60
  - action: set_refund_on_dispute
    request: q
  - action: set_event_based
    request: q
  - action: set_callbacks
    request: q
    callbacks:
      on_settle: true
  - action: propose
    request: q
    proposer: \"0x000000000000000000000000000000000000000a\"
    value: -3
  - action: dispute
    request: q
    disputer: \"0x000000000000000000000000000000000000000d\"
    payer: \"0x000000000000000000000000000000000000000e\"
  - action: advance
    secs: 10
  - action: answer
    request: q
    value: \"-170141183460469231731687303715884105728\"
  - action: settle
    request: q
    expect: error
  - action: settle_dispute
    request: q
    dispute: 0
"
        );
        let scenario = Scenario::from_yaml_str(&yaml).unwrap();
        let names: Vec<_> = scenario.steps.iter().map(|s| s.action.name()).collect();
        assert_eq!(
            names,
            [
                "request",
                "set_bond",
                "set_liveness",
                "set_refund_on_dispute",
                "set_event_based",
                "set_callbacks",
                "propose",
                "dispute",
                "advance",
                "answer",
                "settle",
                "settle_dispute",
            ]
        );
        assert!(matches!(
            scenario.steps[6].action,
            Action::Propose { value: -3, .. }
        ));
        assert!(matches!(
            scenario.steps[9].action,
            Action::Answer { value: i128::MIN, .. }
        ));
        assert_eq!(scenario.steps[10].expect, Expectation::Error);
        assert_eq!(scenario.steps[0].expect, Expectation::Ok);
        assert!(scenario.config.is_none());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let yaml = format!("{HEADER}steps:\n  - action: teleport\n");
        assert!(Scenario::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let yaml = format!("{HEADER}steps: []\nsurprise: true\n");
        assert!(Scenario::from_yaml_str(&yaml).is_err());
    }
}
