//! Interfaces of the collaborators the engine reads from and settles through.
//!
//! Mutating oracle calls carry the caller's address; an oracle rejects them
//! with [`LedgerError::Unauthorized`] unless the caller is its current
//! governance address.

use crate::{Address, Amount, LedgerError, QueryId, Timestamp};

/// Authoritative store of reported values.
pub trait ValueStore {
    fn has_value(&self, query_id: &QueryId, timestamp: Timestamp) -> bool;

    fn get_value(&self, query_id: &QueryId, timestamp: Timestamp) -> Option<Vec<u8>>;

    fn get_reporter(&self, query_id: &QueryId, timestamp: Timestamp) -> Option<Address>;

    /// Hides the value from "current value" reads while a dispute is open.
    fn mark_disputed(&mut self, caller: Address, query_id: &QueryId, timestamp: Timestamp) -> Result<(), LedgerError>;

    /// Restores a disputed value after the dispute failed.
    fn mark_resolved(&mut self, caller: Address, query_id: &QueryId, timestamp: Timestamp) -> Result<(), LedgerError>;

    /// Permanently invalidates a value after the dispute passed.
    fn invalidate_value(&mut self, caller: Address, query_id: &QueryId, timestamp: Timestamp) -> Result<(), LedgerError>;
}

/// Reporter stakes and oracle parameters.
pub trait StakeLedger {
    /// Minimum stake a reporter must hold.
    fn stake_amount(&self) -> Amount;

    fn reporting_lock(&self) -> Timestamp;

    fn reporter_stake(&self, reporter: &Address) -> Amount;

    /// Number of reporters currently holding at least the stake amount.
    fn total_stakers(&self) -> u64;

    fn governance_address(&self) -> Address;

    fn set_governance_address(&mut self, caller: Address, new_governance: Address) -> Result<(), LedgerError>;

    fn set_stake_amount(&mut self, caller: Address, amount: Amount) -> Result<(), LedgerError>;

    fn set_reporting_lock(&mut self, caller: Address, lock: Timestamp) -> Result<(), LedgerError>;

    /// Moves up to `amount` of the reporter's stake to `recipient` and
    /// returns the amount actually moved.
    fn slash(
        &mut self,
        caller: Address,
        reporter: Address,
        amount: Amount,
        recipient: Address,
    ) -> Result<Amount, LedgerError>;

    /// Moves `amount` of the caller's tokens back into the reporter's stake,
    /// undoing a slash.
    fn restore_stake(&mut self, caller: Address, reporter: Address, amount: Amount) -> Result<(), LedgerError>;
}

/// Tip weight source for the Users constituency.
pub trait TipLedger {
    fn user_tip_weight(&self, user: &Address, query_id: &QueryId) -> Amount;

    fn total_tip_weight(&self, query_id: &QueryId) -> Amount;
}

/// Fungible token used for stakes and fees.
pub trait TokenLedger {
    fn balance_of(&self, account: &Address) -> Amount;

    fn total_supply(&self) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError>;

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Pays every `(recipient, amount)` from `from`, or nothing at all.
    fn transfer_batch(&mut self, from: Address, payouts: &[(Address, Amount)]) -> Result<(), LedgerError> {
        let total = payouts
            .iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(LedgerError::Overflow)?;
        let available = self.balance_of(&from);
        if available < total {
            return Err(LedgerError::InsufficientBalance { needed: total, available });
        }
        for (to, amount) in payouts {
            self.transfer(from, *to, *amount)?;
        }
        Ok(())
    }
}

/// Everything the engine needs from the outside world.
pub trait OracleEnvironment: ValueStore + StakeLedger + TipLedger + TokenLedger {}

impl<T> OracleEnvironment for T where T: ValueStore + StakeLedger + TipLedger + TokenLedger {}
