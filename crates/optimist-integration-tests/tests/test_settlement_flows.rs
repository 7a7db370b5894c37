//! # Settlement Flows
//!
//! End-to-end request → propose → (dispute) → settle runs through the
//! oracle, the in-memory escrow ledger and the in-memory arbitrator, checking
//! every party's balance and that the request's escrow drains to zero.

use std::collections::BTreeMap;
use std::sync::Arc;

use optimist_arbitration::InMemoryArbitrator;
use optimist_core::{
    Address, Amount, AncillaryData, Currency, FixedPoint, Identifier, ManualClock, RequestKey,
    Timestamp,
};
use optimist_escrow::{EscrowLedger, InMemoryLedger};
use optimist_oracle::{
    AllowAllTopics, OptimisticOracle, OracleConfig, PayoutKind, RequestState, Resolution,
};

const START: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z
const LIVENESS: u64 = 7_200;
const FUNDS: u128 = 1_000_000;

const REQUESTER: Address = Address::from_low_u64(0x1001);
const PROPOSER: Address = Address::from_low_u64(0x2002);
const DISPUTER: Address = Address::from_low_u64(0x3003);
const FEE_SINK: Address = Address::from_low_u64(0xfee);

fn usdc() -> Currency {
    Currency::new("USDC").unwrap()
}

struct Env {
    clock: ManualClock,
    ledger: Arc<InMemoryLedger>,
    arbitrator: Arc<InMemoryArbitrator<i128>>,
    oracle: OptimisticOracle<i128>,
}

impl Env {
    fn new(final_fee: u128) -> Self {
        Self::with_config(
            OracleConfig::new(
                FEE_SINK,
                BTreeMap::from([(usdc(), Amount::new(final_fee))]),
            )
            .unwrap()
            .with_default_liveness(LIVENESS)
            .unwrap(),
        )
    }

    fn with_config(config: OracleConfig) -> Self {
        let clock = ManualClock::at_epoch_secs(START).unwrap();
        let ledger = Arc::new(InMemoryLedger::new());
        for who in [REQUESTER, PROPOSER, DISPUTER] {
            ledger.mint(who, &usdc(), Amount::new(FUNDS)).unwrap();
            ledger.approve(who, &usdc(), Amount::MAX);
        }
        let arbitrator = Arc::new(InMemoryArbitrator::new());
        let oracle = OptimisticOracle::new(
            config,
            Arc::new(clock.clone()),
            ledger.clone(),
            arbitrator.clone(),
            Arc::new(AllowAllTopics),
        )
        .unwrap();
        Self {
            clock,
            ledger,
            arbitrator,
            oracle,
        }
    }

    fn balance(&self, who: Address) -> u128 {
        self.ledger.balance_of(&who, &usdc()).get()
    }

    fn escrowed(&self, key: &RequestKey) -> u128 {
        self.ledger.escrowed(&key.id().unwrap(), &usdc()).get()
    }

    fn assert_supply_conserved(&self) {
        assert_eq!(
            self.ledger.total_supply(&usdc()).unwrap(),
            Amount::new(3 * FUNDS)
        );
    }
}

fn price_key() -> RequestKey {
    RequestKey::new(
        REQUESTER,
        Identifier::new("ETH/USD").unwrap(),
        Timestamp::from_epoch_secs(START - 3_600).unwrap(),
        AncillaryData::from("twap:1h"),
    )
}

// ---------------------------------------------------------------------------
// 1. Undisputed
// ---------------------------------------------------------------------------

#[test]
fn undisputed_proposal_collects_reward() {
    let env = Env::new(1_500);
    let key = price_key();
    env.oracle
        .create_request(key.clone(), usdc(), Amount::new(400))
        .unwrap();
    env.oracle.propose(PROPOSER, &key, 3_120, None).unwrap();
    assert_eq!(env.balance(PROPOSER), FUNDS - 3_000);

    env.clock.advance(LIVENESS - 1).unwrap();
    assert_eq!(env.oracle.get_state(&key).unwrap(), RequestState::Proposed);
    env.clock.advance(1).unwrap();
    assert_eq!(env.oracle.get_state(&key).unwrap(), RequestState::Expired);

    let receipt = env.oracle.settle(&key).unwrap();
    assert_eq!(receipt.value, 3_120);
    assert_eq!(receipt.resolution, Resolution::Expired);
    assert_eq!(env.balance(PROPOSER), FUNDS + 400);
    assert_eq!(env.balance(REQUESTER), FUNDS - 400);
    assert_eq!(env.balance(FEE_SINK), 0);
    assert_eq!(env.escrowed(&key), 0);
    env.assert_supply_conserved();
}

// ---------------------------------------------------------------------------
// 2. Disputed
// ---------------------------------------------------------------------------

fn disputed(env: &Env, key: &RequestKey, reward: u128, proposed: i128, answer: i128) {
    env.oracle
        .create_request(key.clone(), usdc(), Amount::new(reward))
        .unwrap();
    env.oracle.propose(PROPOSER, key, proposed, None).unwrap();
    let dispute = env.oracle.dispute(DISPUTER, key).unwrap();
    assert_eq!(env.oracle.get_state(key).unwrap(), RequestState::Disputed);
    env.arbitrator.push_answer(&dispute.question, answer).unwrap();
    assert_eq!(env.oracle.get_state(key).unwrap(), RequestState::Resolved);
}

#[test]
fn proposer_wins_half_of_disputer_bond() {
    // B = F = 1500, R = 400.
    let env = Env::new(1_500);
    let key = price_key();
    disputed(&env, &key, 400, 3_120, 3_120);

    let receipt = env.oracle.settle(&key).unwrap();
    assert_eq!(receipt.value, 3_120);
    assert_eq!(env.balance(PROPOSER), FUNDS + 750 + 400);
    assert_eq!(env.balance(DISPUTER), FUNDS - 3_000);
    assert_eq!(env.balance(FEE_SINK), 1_500 + 750);
    assert_eq!(env.escrowed(&key), 0);
    env.assert_supply_conserved();
}

#[test]
fn disputer_wins_and_value_is_the_answer() {
    let env = Env::new(1_500);
    let key = price_key();
    disputed(&env, &key, 400, 3_120, 2_999);

    assert_eq!(env.oracle.settle_and_get_value(&key).unwrap(), 2_999);
    assert_eq!(env.balance(DISPUTER), FUNDS + 750 + 400);
    assert_eq!(env.balance(PROPOSER), FUNDS - 3_000);
    assert_eq!(env.balance(FEE_SINK), 2_250);
    env.assert_supply_conserved();
}

#[test]
fn odd_bond_remainder_goes_to_winner() {
    let env = Env::new(0);
    let key = price_key();
    env.oracle
        .create_request(key.clone(), usdc(), Amount::ZERO)
        .unwrap();
    env.oracle.set_bond(&REQUESTER, &key, Amount::new(101)).unwrap();
    env.oracle.propose(PROPOSER, &key, 1, None).unwrap();
    let dispute = env.oracle.dispute(DISPUTER, &key).unwrap();
    env.arbitrator.push_answer(&dispute.question, 1).unwrap();

    let receipt = env.oracle.settle(&key).unwrap();
    // Winner: own 101 + ceil(101/2) = 51. Sink: floor(101/2) = 50.
    assert_eq!(env.balance(PROPOSER), FUNDS + 51);
    assert_eq!(env.balance(FEE_SINK), 50);
    assert!(receipt
        .payouts
        .iter()
        .any(|p| p.kind == PayoutKind::BondShare && p.amount == Amount::new(51)));
    env.assert_supply_conserved();
}

#[test]
fn zero_final_fee_and_zero_bond_move_nothing() {
    let env = Env::new(0);
    let key = price_key();
    disputed(&env, &key, 0, 5, 6);
    let receipt = env.oracle.settle(&key).unwrap();
    assert!(receipt.payouts.is_empty());
    assert_eq!(env.balance(PROPOSER), FUNDS);
    assert_eq!(env.balance(DISPUTER), FUNDS);
    assert_eq!(env.oracle.get_state(&key).unwrap(), RequestState::Settled);
}

#[test]
fn default_bond_scales_with_percentage() {
    let config = OracleConfig::new(FEE_SINK, BTreeMap::from([(usdc(), Amount::new(1_000))]))
        .unwrap()
        .with_default_bond_percentage("0.25".parse::<FixedPoint>().unwrap());
    let env = Env::with_config(config);
    let key = price_key();
    env.oracle
        .create_request(key.clone(), usdc(), Amount::ZERO)
        .unwrap();
    let receipt = env.oracle.propose(PROPOSER, &key, 1, None).unwrap();
    assert_eq!(receipt.bond, Amount::new(250));
    assert_eq!(env.balance(PROPOSER), FUNDS - 1_250);
}

// ---------------------------------------------------------------------------
// 3. Refunds and event-based requests
// ---------------------------------------------------------------------------

#[test]
fn refund_on_dispute_pays_requester_not_winner() {
    let env = Env::new(100);
    let key = price_key();
    env.oracle
        .create_request(key.clone(), usdc(), Amount::new(400))
        .unwrap();
    env.oracle.set_refund_on_dispute(&REQUESTER, &key).unwrap();
    env.oracle.propose(PROPOSER, &key, 1, None).unwrap();
    let dispute = env.oracle.dispute(DISPUTER, &key).unwrap();
    assert_eq!(env.balance(REQUESTER), FUNDS);

    env.arbitrator.push_answer(&dispute.question, 1).unwrap();
    let receipt = env.oracle.settle(&key).unwrap();
    assert!(receipt.payouts.iter().all(|p| p.kind != PayoutKind::Reward));
    assert_eq!(env.balance(PROPOSER), FUNDS + 50);
    assert_eq!(env.escrowed(&key), 0);
    env.assert_supply_conserved();
}

#[test]
fn event_based_request_asks_about_proposal_time() {
    let env = Env::new(100);
    let key = RequestKey::new(
        REQUESTER,
        Identifier::new("YES_OR_NO_QUERY").unwrap(),
        Timestamp::from_epoch_secs(START).unwrap(),
        AncillaryData::from("q: did the launch happen?"),
    );
    env.oracle
        .create_request(key.clone(), usdc(), Amount::new(10))
        .unwrap();
    env.oracle.set_event_based(&REQUESTER, &key).unwrap();

    env.clock.advance(86_400).unwrap();
    env.oracle.propose(PROPOSER, &key, 1, None).unwrap();
    env.clock.advance(60).unwrap();
    let dispute = env.oracle.dispute(DISPUTER, &key).unwrap();

    assert_eq!(dispute.question.timestamp.epoch_secs(), START + 86_400);
    assert_eq!(dispute.refund, Amount::new(10));
    assert_eq!(
        dispute.question.ancillary_data,
        key.stamped_ancillary_data()
    );
}
