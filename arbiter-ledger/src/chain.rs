//! The oracle, its token and its tip ledger wired together.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use arbiter_types::{
    Address, Amount, LedgerError, QueryId, StakeLedger, TipLedger, Timestamp, TokenLedger, ValueStore,
};

use crate::oracle::{InMemoryOracle, ReportStatus};
use crate::tips::InMemoryTips;
use crate::token::InMemoryToken;

/// Deployment parameters of the in-memory oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Account holding staked tokens.
    pub oracle_address: Address,
    /// Account holding tipped tokens.
    pub tip_pool_address: Address,
    /// Initial governance address of the oracle (usually the deployer).
    pub governance: Address,
    pub stake_amount: Amount,
    pub reporting_lock: Timestamp,
}

#[derive(Debug, Clone)]
pub struct InMemoryChain {
    params: ChainParams,
    token: InMemoryToken,
    oracle: InMemoryOracle,
    tips: InMemoryTips,
}

impl InMemoryChain {
    pub fn new(params: ChainParams) -> Self {
        let oracle = InMemoryOracle::new(params.governance, params.stake_amount, params.reporting_lock);
        info!(
            "Deployed in-memory oracle {} with stake amount {} and reporting lock {}s",
            hex::encode(params.oracle_address),
            params.stake_amount,
            params.reporting_lock
        );
        Self {
            params,
            token: InMemoryToken::new(),
            oracle,
            tips: InMemoryTips::new(),
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn oracle_address(&self) -> Address {
        self.params.oracle_address
    }

    pub fn token(&self) -> &InMemoryToken {
        &self.token
    }

    pub fn oracle(&self) -> &InMemoryOracle {
        &self.oracle
    }

    pub fn tips(&self) -> &InMemoryTips {
        &self.tips
    }

    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.token.mint(to, amount)
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.token.approve(owner, spender, amount);
    }

    /// Moves tokens from the staker into the oracle and credits the stake.
    pub fn deposit_stake(&mut self, staker: Address, amount: Amount) -> Result<(), LedgerError> {
        self.token.transfer(staker, self.params.oracle_address, amount)?;
        self.oracle.credit_stake(staker, amount)?;
        debug!("Staker {} deposited {}", hex::encode(staker), amount);
        Ok(())
    }

    pub fn submit_value(
        &mut self,
        reporter: Address,
        query_id: QueryId,
        value: Vec<u8>,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.oracle.submit_value(reporter, query_id, value, now)?;
        debug!("Reporter {} submitted value for {} at {}", hex::encode(reporter), hex::encode(query_id), now);
        Ok(())
    }

    /// Pays a tip into the tip pool and records its weight for the query.
    pub fn tip(&mut self, tipper: Address, query_id: QueryId, amount: Amount) -> Result<(), LedgerError> {
        self.token.transfer(tipper, self.params.tip_pool_address, amount)?;
        self.tips.record(tipper, query_id, amount)
    }

    pub fn current_value(&self, query_id: &QueryId) -> Option<(Timestamp, &[u8])> {
        self.oracle.current_value(query_id)
    }

    pub fn report_status(&self, query_id: &QueryId, timestamp: Timestamp) -> Option<ReportStatus> {
        self.oracle.report(query_id, timestamp).map(|report| report.status)
    }
}

impl ValueStore for InMemoryChain {
    fn has_value(&self, query_id: &QueryId, timestamp: Timestamp) -> bool {
        self.oracle.report(query_id, timestamp).is_some()
    }

    fn get_value(&self, query_id: &QueryId, timestamp: Timestamp) -> Option<Vec<u8>> {
        self.oracle.report(query_id, timestamp).map(|report| report.value.clone())
    }

    fn get_reporter(&self, query_id: &QueryId, timestamp: Timestamp) -> Option<Address> {
        self.oracle.report(query_id, timestamp).map(|report| report.reporter)
    }

    fn mark_disputed(&mut self, caller: Address, query_id: &QueryId, timestamp: Timestamp) -> Result<(), LedgerError> {
        self.oracle.set_status(caller, query_id, timestamp, ReportStatus::Disputed)
    }

    fn mark_resolved(&mut self, caller: Address, query_id: &QueryId, timestamp: Timestamp) -> Result<(), LedgerError> {
        self.oracle.set_status(caller, query_id, timestamp, ReportStatus::Valid)
    }

    fn invalidate_value(&mut self, caller: Address, query_id: &QueryId, timestamp: Timestamp) -> Result<(), LedgerError> {
        self.oracle.set_status(caller, query_id, timestamp, ReportStatus::Invalidated)
    }
}

impl StakeLedger for InMemoryChain {
    fn stake_amount(&self) -> Amount {
        self.oracle.stake_amount()
    }

    fn reporting_lock(&self) -> Timestamp {
        self.oracle.reporting_lock()
    }

    fn reporter_stake(&self, reporter: &Address) -> Amount {
        self.oracle.reporter_stake(reporter)
    }

    fn total_stakers(&self) -> u64 {
        self.oracle.total_stakers()
    }

    fn governance_address(&self) -> Address {
        self.oracle.governance()
    }

    fn set_governance_address(&mut self, caller: Address, new_governance: Address) -> Result<(), LedgerError> {
        self.oracle.set_governance_address(caller, new_governance)?;
        info!("Oracle governance address changed to {}", hex::encode(new_governance));
        Ok(())
    }

    fn set_stake_amount(&mut self, caller: Address, amount: Amount) -> Result<(), LedgerError> {
        self.oracle.set_stake_amount(caller, amount)
    }

    fn set_reporting_lock(&mut self, caller: Address, lock: Timestamp) -> Result<(), LedgerError> {
        self.oracle.set_reporting_lock(caller, lock)
    }

    fn slash(
        &mut self,
        caller: Address,
        reporter: Address,
        amount: Amount,
        recipient: Address,
    ) -> Result<Amount, LedgerError> {
        self.oracle.ensure_slash_allowed(&caller)?;
        let available = self.oracle.reporter_stake(&reporter).min(amount);
        // Move the tokens first so a failed transfer leaves the stake intact.
        self.token.transfer(self.params.oracle_address, recipient, available)?;
        let taken = self.oracle.debit_stake(&reporter, available);
        info!("Slashed {} from reporter {}", taken, hex::encode(reporter));
        Ok(taken)
    }

    fn restore_stake(&mut self, caller: Address, reporter: Address, amount: Amount) -> Result<(), LedgerError> {
        self.oracle.ensure_slash_allowed(&caller)?;
        self.token.transfer(caller, self.params.oracle_address, amount)?;
        self.oracle.credit_stake(reporter, amount)?;
        info!("Restored {} to reporter {}", amount, hex::encode(reporter));
        Ok(())
    }
}

impl TipLedger for InMemoryChain {
    fn user_tip_weight(&self, user: &Address, query_id: &QueryId) -> Amount {
        self.tips.user_tip_weight(user, query_id)
    }

    fn total_tip_weight(&self, query_id: &QueryId) -> Amount {
        self.tips.total_tip_weight(query_id)
    }
}

impl TokenLedger for InMemoryChain {
    fn balance_of(&self, account: &Address) -> Amount {
        self.token.balance_of(account)
    }

    fn total_supply(&self) -> Amount {
        self.token.total_supply()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.token.allowance(owner, spender)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        self.token.transfer(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.token.transfer_from(spender, from, to, amount)
    }
}
