use std::collections::HashMap;

use arbiter_types::{Hash, VoteId};

/// Lineage hash → vote ids of every round, in order. Append-only.
#[derive(Debug, Clone, Default)]
pub struct VoteRoundIndex {
    rounds: HashMap<Hash, Vec<VoteId>>,
}

impl VoteRoundIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds(&self, hash: &Hash) -> &[VoteId] {
        self.rounds.get(hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Round number the next vote on this lineage would get.
    pub fn next_round(&self, hash: &Hash) -> u32 {
        self.rounds(hash).len() as u32 + 1
    }

    pub fn latest(&self, hash: &Hash) -> Option<VoteId> {
        self.rounds(hash).last().copied()
    }

    pub fn first(&self, hash: &Hash) -> Option<VoteId> {
        self.rounds(hash).first().copied()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.rounds.contains_key(hash)
    }

    pub fn push(&mut self, hash: Hash, vote_id: VoteId) -> u32 {
        let lineage = self.rounds.entry(hash).or_default();
        lineage.push(vote_id);
        lineage.len() as u32
    }
}
