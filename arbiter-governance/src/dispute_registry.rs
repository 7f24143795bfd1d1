//! Disputed reports, open-dispute counters and the reporter index.

use std::collections::HashMap;

use log::debug;

use arbiter_types::{Address, Dispute, QueryId, VoteId};

#[derive(Debug, Clone, Default)]
pub struct DisputeRegistry {
    disputes: HashMap<VoteId, Dispute>,
    open_disputes_on_id: HashMap<QueryId, u64>,
    disputes_by_reporter: HashMap<Address, Vec<VoteId>>,
}

impl DisputeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the dispute for `vote_id`. Only round 1 opens a new slot in
    /// the open-dispute counter and the reporter index; escalations reuse
    /// both.
    pub fn record(&mut self, vote_id: VoteId, dispute: Dispute, round: u32) {
        if round == 1 {
            *self.open_disputes_on_id.entry(dispute.query_id).or_insert(0) += 1;
            self.disputes_by_reporter
                .entry(dispute.disputed_reporter)
                .or_default()
                .push(vote_id);
        }
        debug!(
            "Recorded dispute {} on query {} (round {})",
            vote_id,
            hex::encode(dispute.query_id),
            round
        );
        self.disputes.insert(vote_id, dispute);
    }

    /// Called once when the final round of a lineage executes.
    pub fn close(&mut self, query_id: &QueryId) {
        if let Some(open) = self.open_disputes_on_id.get_mut(query_id) {
            *open = open.saturating_sub(1);
        }
    }

    pub fn get(&self, vote_id: VoteId) -> Option<&Dispute> {
        self.disputes.get(&vote_id)
    }

    pub fn open_disputes_on_id(&self, query_id: &QueryId) -> u64 {
        self.open_disputes_on_id.get(query_id).copied().unwrap_or(0)
    }

    /// First-round vote ids of every dispute lineage against `reporter`.
    pub fn disputes_by_reporter(&self, reporter: &Address) -> &[VoteId] {
        self.disputes_by_reporter
            .get(reporter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
