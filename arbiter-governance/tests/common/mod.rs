#![allow(dead_code)]

use arbiter_governance::{GovernanceConfig, GovernanceCoordinator};
use arbiter_ledger::{ChainParams, InMemoryChain};
use arbiter_types::{query_id_from_u64, Address, Amount, CallContext, QueryId, Timestamp, TokenLedger, DAY};

pub type Governance = GovernanceCoordinator<InMemoryChain>;

pub const GOV: Address = [0x60; 20];
pub const ORACLE: Address = [0x0a; 20];
pub const TIP_POOL: Address = [0x70; 20];
pub const MULTISIG: Address = [0x3c; 20];

pub const REPORTER: Address = [0x01; 20];
pub const ALICE: Address = [0x02; 20];
pub const BOB: Address = [0x03; 20];
pub const CAROL: Address = [0x04; 20];

pub const STAKE: Amount = 100;
pub const FEE: Amount = 10;
pub const INITIAL_BALANCE: Amount = 1_000;
pub const REPORTING_LOCK: Timestamp = DAY / 2;

pub const T0: Timestamp = 1_700_000_000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn query() -> QueryId {
    query_id_from_u64(1)
}

pub fn at(caller: Address, timestamp: Timestamp) -> CallContext {
    CallContext::new(caller, timestamp, timestamp / 12)
}

pub fn config(governance: Address) -> GovernanceConfig {
    GovernanceConfig {
        min_dispute_fee: FEE,
        proposal_fee: FEE,
        ..GovernanceConfig::new(governance, ORACLE, MULTISIG)
    }
}

/// Five funded accounts that have approved the governance escrow, and a
/// reporter holding exactly the stake amount.
pub fn deploy_with(stake_amount: Amount, configure: impl FnOnce(&mut GovernanceConfig)) -> Governance {
    init_logging();
    let mut chain = InMemoryChain::new(ChainParams {
        oracle_address: ORACLE,
        tip_pool_address: TIP_POOL,
        governance: GOV,
        stake_amount,
        reporting_lock: REPORTING_LOCK,
    });
    for account in [REPORTER, ALICE, BOB, CAROL, MULTISIG] {
        chain.mint(account, INITIAL_BALANCE).unwrap();
        chain.approve(account, GOV, Amount::MAX);
    }
    chain.deposit_stake(REPORTER, stake_amount).unwrap();
    let mut config = config(GOV);
    configure(&mut config);
    GovernanceCoordinator::new(config, chain).unwrap()
}

pub fn deploy() -> Governance {
    deploy_with(STAKE, |_| {})
}

/// Deploys and submits one report from `REPORTER` at `T0`.
pub fn deploy_with_report() -> Governance {
    let mut gov = deploy();
    submit(&mut gov, REPORTER, query(), T0);
    gov
}

pub fn submit(gov: &mut Governance, reporter: Address, query_id: QueryId, timestamp: Timestamp) {
    gov.env_mut()
        .submit_value(reporter, query_id, b"1850.25".to_vec(), timestamp)
        .unwrap();
}

pub fn balance(gov: &Governance, account: &Address) -> Amount {
    gov.env().balance_of(account)
}
