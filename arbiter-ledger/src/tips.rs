use std::collections::HashMap;

use arbiter_types::{Address, Amount, LedgerError, QueryId};

/// Cumulative tips per query, per tipper.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTips {
    tips: HashMap<QueryId, HashMap<Address, Amount>>,
    totals: HashMap<QueryId, Amount>,
}

impl InMemoryTips {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, tipper: Address, query_id: QueryId, amount: Amount) -> Result<(), LedgerError> {
        let total = self.totals.entry(query_id).or_insert(0);
        *total = total.checked_add(amount).ok_or(LedgerError::Overflow)?;
        let user = self.tips.entry(query_id).or_default().entry(tipper).or_insert(0);
        *user = user.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub fn user_tip_weight(&self, user: &Address, query_id: &QueryId) -> Amount {
        self.tips
            .get(query_id)
            .and_then(|users| users.get(user))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_tip_weight(&self, query_id: &QueryId) -> Amount {
        self.totals.get(query_id).copied().unwrap_or(0)
    }
}
