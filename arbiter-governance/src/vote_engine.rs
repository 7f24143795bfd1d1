//! Vote records, ballots and voter weights.
//!
//! The book is an append-only arena: vote ids are 1-based positions in it
//! and never change.

use std::collections::{HashMap, HashSet};

use log::debug;

use arbiter_types::{
    Address, Amount, Constituency, OracleEnvironment, QueryId, Vote, VoteChoice, VoteId,
};

use crate::error::{GovernanceError, GovernanceResult};
use crate::tally::EligibleWeights;

/// A voter's weight in each constituency at the moment of voting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoterWeights {
    pub tokenholders: Amount,
    pub users: Amount,
    pub reporters: Amount,
    pub team_multisig: Amount,
}

impl VoterWeights {
    /// Tokenholders count wallet balance plus staked balance; users count
    /// tips on the disputed query (none for proposals); reporters and the
    /// multisig get a unit weight.
    pub fn compute<E: OracleEnvironment>(
        env: &E,
        voter: &Address,
        disputed_query: Option<&QueryId>,
        team_multisig: &Address,
    ) -> Self {
        let staked = env.reporter_stake(voter);
        let stake_amount = env.stake_amount();
        Self {
            tokenholders: env.balance_of(voter).saturating_add(staked),
            users: disputed_query
                .map(|query_id| env.user_tip_weight(voter, query_id))
                .unwrap_or(0),
            reporters: if staked > 0 && staked >= stake_amount { 1 } else { 0 },
            team_multisig: if voter == team_multisig { 1 } else { 0 },
        }
    }

    pub fn get(&self, constituency: Constituency) -> Amount {
        match constituency {
            Constituency::Tokenholders => self.tokenholders,
            Constituency::Users => self.users,
            Constituency::Reporters => self.reporters,
            Constituency::TeamMultisig => self.team_multisig,
        }
    }
}

/// Eligible weight per constituency, read from the environment at tally time.
pub fn eligible_weights<E: OracleEnvironment>(env: &E, disputed_query: Option<&QueryId>) -> EligibleWeights {
    EligibleWeights {
        tokenholders: env.total_supply(),
        users: disputed_query
            .map(|query_id| env.total_tip_weight(query_id))
            .unwrap_or(0),
        reporters: env.total_stakers() as Amount,
        team_multisig: 1,
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoteBook {
    votes: Vec<Vote>,
    voters: HashMap<VoteId, HashSet<Address>>,
    vote_tally_by_address: HashMap<Address, u64>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote_count(&self) -> u64 {
        self.votes.len() as u64
    }

    /// Id the next opened vote will receive.
    pub fn next_id(&self) -> VoteId {
        self.vote_count() + 1
    }

    pub fn open(&mut self, vote: Vote) -> VoteId {
        self.votes.push(vote);
        self.vote_count()
    }

    pub fn get(&self, vote_id: VoteId) -> GovernanceResult<&Vote> {
        vote_id
            .checked_sub(1)
            .and_then(|index| self.votes.get(index as usize))
            .ok_or(GovernanceError::InvalidVoteId(vote_id))
    }

    pub fn get_mut(&mut self, vote_id: VoteId) -> GovernanceResult<&mut Vote> {
        vote_id
            .checked_sub(1)
            .and_then(|index| self.votes.get_mut(index as usize))
            .ok_or(GovernanceError::InvalidVoteId(vote_id))
    }

    pub fn did_vote(&self, vote_id: VoteId, voter: &Address) -> bool {
        self.voters
            .get(&vote_id)
            .map_or(false, |voters| voters.contains(voter))
    }

    pub fn vote_tally_by_address(&self, voter: &Address) -> u64 {
        self.vote_tally_by_address.get(voter).copied().unwrap_or(0)
    }

    /// Checks that `voter` may still vote on `vote_id`.
    pub fn ensure_can_vote(&self, vote_id: VoteId, voter: &Address) -> GovernanceResult<&Vote> {
        let vote = self.get(vote_id)?;
        if vote.is_tallied() {
            return Err(GovernanceError::VotingClosed(vote_id));
        }
        if self.did_vote(vote_id, voter) {
            return Err(GovernanceError::AlreadyVoted(vote_id));
        }
        Ok(vote)
    }

    /// Adds the voter's weights to the chosen bucket of every constituency
    /// and marks the voter. Callers validate with [`Self::ensure_can_vote`] first.
    pub fn record_ballot(
        &mut self,
        vote_id: VoteId,
        voter: Address,
        weights: &VoterWeights,
        choice: VoteChoice,
    ) -> GovernanceResult<()> {
        let vote = self.get_mut(vote_id)?;
        for constituency in Constituency::ALL {
            let weight = weights.get(constituency);
            if weight > 0 {
                vote.tallies.get_mut(constituency).add(choice, weight);
            }
        }
        self.voters.entry(vote_id).or_default().insert(voter);
        *self.vote_tally_by_address.entry(voter).or_insert(0) += 1;
        debug!(
            "Vote {} ballot from {}: {:?} with weights {:?}",
            vote_id,
            hex::encode(voter),
            choice,
            weights
        );
        Ok(())
    }
}
