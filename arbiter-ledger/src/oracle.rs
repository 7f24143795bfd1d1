//! Reported values, reporter stakes and oracle parameters.
//!
//! Token movements (deposits, slashing) are performed by the owning
//! [`crate::InMemoryChain`]; this module only keeps the bookkeeping.

use std::collections::{BTreeMap, HashMap};

use arbiter_types::{Address, Amount, LedgerError, QueryId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Valid,
    Disputed,
    Invalidated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub value: Vec<u8>,
    pub reporter: Address,
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakerInfo {
    pub staked_balance: Amount,
    pub last_report: Option<Timestamp>,
    pub reports_submitted: u64,
}

#[derive(Debug, Clone)]
pub struct InMemoryOracle {
    governance: Address,
    stake_amount: Amount,
    reporting_lock: Timestamp,
    stakers: HashMap<Address, StakerInfo>,
    reports: HashMap<QueryId, BTreeMap<Timestamp, Report>>,
}

impl InMemoryOracle {
    pub fn new(governance: Address, stake_amount: Amount, reporting_lock: Timestamp) -> Self {
        Self {
            governance,
            stake_amount,
            reporting_lock,
            stakers: HashMap::new(),
            reports: HashMap::new(),
        }
    }

    fn ensure_governance(&self, caller: &Address) -> Result<(), LedgerError> {
        if *caller != self.governance {
            return Err(LedgerError::Unauthorized(hex::encode(caller)));
        }
        Ok(())
    }

    fn report_mut(&mut self, query_id: &QueryId, timestamp: Timestamp) -> Result<&mut Report, LedgerError> {
        self.reports
            .get_mut(query_id)
            .and_then(|series| series.get_mut(&timestamp))
            .ok_or(LedgerError::NoValue)
    }

    pub fn report(&self, query_id: &QueryId, timestamp: Timestamp) -> Option<&Report> {
        self.reports.get(query_id).and_then(|series| series.get(&timestamp))
    }

    pub fn staker_info(&self, staker: &Address) -> Option<&StakerInfo> {
        self.stakers.get(staker)
    }

    pub fn governance(&self) -> Address {
        self.governance
    }

    pub fn stake_amount(&self) -> Amount {
        self.stake_amount
    }

    pub fn reporting_lock(&self) -> Timestamp {
        self.reporting_lock
    }

    pub fn reporter_stake(&self, reporter: &Address) -> Amount {
        self.stakers.get(reporter).map(|info| info.staked_balance).unwrap_or(0)
    }

    pub fn total_stakers(&self) -> u64 {
        self.stakers
            .values()
            .filter(|info| info.staked_balance >= self.stake_amount && info.staked_balance > 0)
            .count() as u64
    }

    pub(crate) fn credit_stake(&mut self, staker: Address, amount: Amount) -> Result<(), LedgerError> {
        let info = self.stakers.entry(staker).or_default();
        info.staked_balance = info.staked_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Removes up to `amount` from the reporter's stake; returns what was removed.
    pub(crate) fn debit_stake(&mut self, reporter: &Address, amount: Amount) -> Amount {
        match self.stakers.get_mut(reporter) {
            Some(info) => {
                let taken = amount.min(info.staked_balance);
                info.staked_balance -= taken;
                taken
            }
            None => 0,
        }
    }

    pub fn submit_value(
        &mut self,
        reporter: Address,
        query_id: QueryId,
        value: Vec<u8>,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let stake_amount = self.stake_amount;
        let reporting_lock = self.reporting_lock;
        if self.reports.get(&query_id).map_or(false, |series| series.contains_key(&now)) {
            return Err(LedgerError::TimestampTaken);
        }
        let info = self.stakers.get_mut(&reporter).ok_or(LedgerError::InsufficientStake)?;
        if info.staked_balance < stake_amount || info.staked_balance == 0 {
            return Err(LedgerError::InsufficientStake);
        }
        if let Some(last) = info.last_report {
            if now.saturating_sub(last) < reporting_lock {
                return Err(LedgerError::ReportingLocked);
            }
        }
        info.last_report = Some(now);
        info.reports_submitted += 1;
        self.reports.entry(query_id).or_default().insert(
            now,
            Report { value, reporter, status: ReportStatus::Valid },
        );
        Ok(())
    }

    /// Latest value for the query that is neither disputed nor invalidated.
    pub fn current_value(&self, query_id: &QueryId) -> Option<(Timestamp, &[u8])> {
        self.reports.get(query_id).and_then(|series| {
            series
                .iter()
                .rev()
                .find(|(_, report)| report.status == ReportStatus::Valid)
                .map(|(timestamp, report)| (*timestamp, report.value.as_slice()))
        })
    }

    pub fn set_governance_address(&mut self, caller: Address, new_governance: Address) -> Result<(), LedgerError> {
        self.ensure_governance(&caller)?;
        self.governance = new_governance;
        Ok(())
    }

    pub fn set_stake_amount(&mut self, caller: Address, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_governance(&caller)?;
        self.stake_amount = amount;
        Ok(())
    }

    pub fn set_reporting_lock(&mut self, caller: Address, lock: Timestamp) -> Result<(), LedgerError> {
        self.ensure_governance(&caller)?;
        self.reporting_lock = lock;
        Ok(())
    }

    pub fn set_status(
        &mut self,
        caller: Address,
        query_id: &QueryId,
        timestamp: Timestamp,
        status: ReportStatus,
    ) -> Result<(), LedgerError> {
        self.ensure_governance(&caller)?;
        let report = self.report_mut(query_id, timestamp)?;
        report.status = status;
        Ok(())
    }

    pub(crate) fn ensure_slash_allowed(&self, caller: &Address) -> Result<(), LedgerError> {
        self.ensure_governance(caller)
    }
}
