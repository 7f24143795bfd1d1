//! Dispute and proposal governance coordinator.
//!
//! This module provides the single entry point for the dispute lifecycle:
//! opening rounds, voting, tallying and executing. Every state-changing call
//! validates and reads first, performs its collaborator calls, and only then
//! mutates the coordinator's own records.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use arbiter_types::{
    proposal_hash, report_hash, ActionCall, Address, Amount, CallContext, Dispute, GovernanceAction, Hash, LedgerError,
    OracleEnvironment, QueryId, Timestamp, Vote, VoteChoice, VoteId, VoteResult, VoteTallies,
};

use crate::config::GovernanceConfig;
use crate::dispute_registry::DisputeRegistry;
use crate::error::{GovernanceError, GovernanceResult};
use crate::fees::{base_dispute_fee, round_fee};
use crate::proposal_dispatcher::ProposalDispatcher;
use crate::settlement::{settle_dispute, settle_proposal, RoundFee, SettlementPlan, ValueOutcome};
use crate::tally::compute_result;
use crate::vote_engine::{eligible_weights, VoteBook, VoterWeights};
use crate::vote_rounds::VoteRoundIndex;

/// Outcome of a successful [`GovernanceCoordinator::execute_vote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub vote_id: VoteId,
    pub result: VoteResult,
    /// Transfers made from the governance escrow.
    pub payouts: Vec<(Address, Amount)>,
    /// Action applied by a passed proposal.
    pub action: Option<GovernanceAction>,
    /// False when the oracle rejected the value-status update, for example
    /// after governance was handed to another address.
    pub value_status_applied: bool,
}

/// Counters over every vote this coordinator has opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceStats {
    pub total_votes: u64,
    pub dispute_votes: u64,
    pub proposal_votes: u64,
    pub pending_votes: u64,
    pub passed_votes: u64,
    pub failed_votes: u64,
    pub invalid_votes: u64,
    pub executed_votes: u64,
}

/// Dispute and proposal governance over an oracle environment.
pub struct GovernanceCoordinator<E: OracleEnvironment> {
    config: GovernanceConfig,
    env: E,
    disputes: DisputeRegistry,
    rounds: VoteRoundIndex,
    votes: VoteBook,
    dispatcher: ProposalDispatcher,
}

impl<E: OracleEnvironment> GovernanceCoordinator<E> {
    /// Create a coordinator over `env` after validating `config`.
    pub fn new(config: GovernanceConfig, env: E) -> GovernanceResult<Self> {
        config.validate()?;
        info!(
            "Governance {} started for oracle {} (multisig {})",
            hex::encode(config.governance_address),
            hex::encode(config.oracle_address),
            hex::encode(config.team_multisig)
        );
        Ok(Self {
            config,
            env,
            disputes: DisputeRegistry::new(),
            rounds: VoteRoundIndex::new(),
            votes: VoteBook::new(),
            dispatcher: ProposalDispatcher::new(),
        })
    }

    /// Address this coordinator escrows under and calls the oracle as.
    pub fn address(&self) -> Address {
        self.config.governance_address
    }

    /// Active configuration.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Read access to the collaborators.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable access to the collaborators.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Hands the environment back, e.g. to start a successor governance.
    pub fn into_env(self) -> E {
        self.env
    }

    /// Open a dispute on the value reported at `(query_id, timestamp)`, or
    /// escalate an existing dispute on it to the next round.
    pub fn begin_dispute(&mut self, ctx: &CallContext, query_id: QueryId, timestamp: Timestamp) -> GovernanceResult<VoteId> {
        if !self.env.has_value(&query_id, timestamp) {
            return Err(GovernanceError::NoValueExists);
        }
        let hash = report_hash(&query_id, timestamp);
        let round = self.rounds.next_round(&hash);
        let stake_amount = self.env.stake_amount();
        let fee = round_fee(base_dispute_fee(stake_amount, self.config.min_dispute_fee), round, stake_amount);
        let governance = self.config.governance_address;

        let dispute = if round == 1 {
            if ctx.timestamp.saturating_sub(timestamp) >= self.env.reporting_lock() {
                return Err(GovernanceError::ReportingLockExpired);
            }
            let value = self.env.get_value(&query_id, timestamp).ok_or(GovernanceError::NoValueExists)?;
            let reporter = self.env.get_reporter(&query_id, timestamp).ok_or(GovernanceError::NoValueExists)?;
            self.ensure_can_pay(&ctx.caller, fee)?;
            if self.env.governance_address() != governance {
                return Err(LedgerError::Unauthorized(hex::encode(governance)).into());
            }
            let slashed_amount = self.open_first_round(ctx.caller, fee, &query_id, timestamp, reporter, stake_amount)?;
            Dispute { query_id, timestamp, value, disputed_reporter: reporter, slashed_amount }
        } else {
            self.check_escalation(&hash, ctx.timestamp)?;
            let first = self.rounds.first(&hash).ok_or(GovernanceError::NoValueExists)?;
            let dispute = self.disputes.get(first).cloned().ok_or(GovernanceError::InvalidVoteId(first))?;
            self.ensure_can_pay(&ctx.caller, fee)?;
            self.env.transfer_from(governance, ctx.caller, governance, fee)?;
            dispute
        };

        let vote_id = self.open_vote(ctx, hash, round, fee, true, None);
        self.disputes.record(vote_id, dispute, round);
        info!(
            "Dispute {} opened on query {} at {} by {} (round {}, fee {})",
            vote_id,
            hex::encode(query_id),
            timestamp,
            hex::encode(ctx.caller),
            round,
            fee
        );
        Ok(vote_id)
    }

    /// Open a proposal for `action`. A zero `timestamp` starts a new lineage
    /// stamped with the current time; otherwise it names the lineage to
    /// escalate.
    pub fn propose(&mut self, ctx: &CallContext, action: GovernanceAction, timestamp: Timestamp) -> GovernanceResult<VoteId> {
        if matches!(action, GovernanceAction::ChangeGovernanceAddress(_))
            && self.config.restrict_governance_proposals
            && !(self.dispatcher.is_user(&ctx.caller) || ctx.caller == self.config.team_multisig)
        {
            return Err(GovernanceError::Unauthorized(hex::encode(ctx.caller)));
        }
        let governance = self.config.governance_address;
        let call = ProposalDispatcher::encode(&action, governance, self.config.oracle_address)?;
        let proposal_timestamp = if timestamp == 0 { ctx.timestamp } else { timestamp };
        let hash = proposal_hash(&call.target, &call.selector, &call.payload, proposal_timestamp);
        if timestamp != 0 && !self.rounds.contains(&hash) {
            return Err(GovernanceError::UnknownLineage);
        }
        let round = self.rounds.next_round(&hash);
        if round > 1 {
            self.check_escalation(&hash, ctx.timestamp)?;
        }

        let cap = self.env.stake_amount().max(self.config.proposal_fee);
        let fee = round_fee(self.config.proposal_fee, round, cap);
        self.ensure_can_pay(&ctx.caller, fee)?;
        self.env.transfer_from(governance, ctx.caller, governance, fee)?;

        let vote_id = self.open_vote(ctx, hash, round, fee, false, Some(call));
        info!(
            "Proposal {} opened by {}: {:?} (round {}, fee {})",
            vote_id,
            hex::encode(ctx.caller),
            action,
            round,
            fee
        );
        Ok(vote_id)
    }

    /// Propose a new reporter stake amount.
    pub fn propose_change_stake_amount(&mut self, ctx: &CallContext, amount: Amount, timestamp: Timestamp) -> GovernanceResult<VoteId> {
        self.propose(ctx, GovernanceAction::ChangeStakeAmount(amount), timestamp)
    }

    /// Propose a new reporting lock.
    pub fn propose_change_reporting_lock(&mut self, ctx: &CallContext, lock: Timestamp, timestamp: Timestamp) -> GovernanceResult<VoteId> {
        self.propose(ctx, GovernanceAction::ChangeReportingLock(lock), timestamp)
    }

    /// Propose handing oracle governance to `new_governance`.
    pub fn propose_change_governance_address(
        &mut self,
        ctx: &CallContext,
        new_governance: Address,
        timestamp: Timestamp,
    ) -> GovernanceResult<VoteId> {
        self.propose(ctx, GovernanceAction::ChangeGovernanceAddress(new_governance), timestamp)
    }

    /// Propose adding or removing `user` from the user list.
    pub fn propose_update_user_list(
        &mut self,
        ctx: &CallContext,
        user: Address,
        is_user: bool,
        timestamp: Timestamp,
    ) -> GovernanceResult<VoteId> {
        self.propose(ctx, GovernanceAction::UpdateUserList { user, is_user }, timestamp)
    }

    /// Cast the caller's weighted ballot on `vote_id`.
    pub fn vote(&mut self, ctx: &CallContext, vote_id: VoteId, supports: bool, invalid_query: bool) -> GovernanceResult<()> {
        let weights = self.ballot_weights(vote_id, &ctx.caller)?;
        self.votes
            .record_ballot(vote_id, ctx.caller, &weights, VoteChoice::from_flags(supports, invalid_query))
    }

    /// Vote on several ids at once. Either every ballot is recorded or none.
    pub fn vote_on_multiple_disputes(
        &mut self,
        ctx: &CallContext,
        vote_ids: &[VoteId],
        supports: &[bool],
        invalid_query: &[bool],
    ) -> GovernanceResult<()> {
        if vote_ids.len() != supports.len() || vote_ids.len() != invalid_query.len() {
            return Err(GovernanceError::BatchLengthMismatch);
        }
        let mut seen = HashSet::new();
        let mut ballots = Vec::with_capacity(vote_ids.len());
        for (index, vote_id) in vote_ids.iter().enumerate() {
            if !seen.insert(*vote_id) {
                return Err(GovernanceError::AlreadyVoted(*vote_id));
            }
            let weights = self.ballot_weights(*vote_id, &ctx.caller)?;
            ballots.push((*vote_id, weights, VoteChoice::from_flags(supports[index], invalid_query[index])));
        }
        for (vote_id, weights, choice) in ballots {
            self.votes.record_ballot(vote_id, ctx.caller, &weights, choice)?;
        }
        debug!("Batch of {} ballots recorded for {}", vote_ids.len(), hex::encode(ctx.caller));
        Ok(())
    }

    /// Close voting on `vote_id` and fix its result.
    pub fn tally_votes(&mut self, ctx: &CallContext, vote_id: VoteId) -> GovernanceResult<VoteResult> {
        let vote = self.votes.get(vote_id)?;
        if vote.is_tallied() {
            return Err(GovernanceError::AlreadyTallied(vote_id));
        }
        if ctx.timestamp.saturating_sub(vote.start_date) < self.config.vote_duration(vote.is_dispute) {
            return Err(GovernanceError::VotingStillOpen(vote_id));
        }
        let disputed_query = self.disputed_query(vote_id, vote.is_dispute);
        let eligible = eligible_weights(&self.env, disputed_query.as_ref());
        let result = compute_result(&vote.tallies, &eligible);

        let vote = self.votes.get_mut(vote_id)?;
        vote.result = result;
        vote.tally_date = Some(ctx.timestamp);
        info!("Vote {} tallied: {:?}", vote_id, result);
        Ok(result)
    }

    /// Execute the final round of a lineage and settle its escrow.
    pub fn execute_vote(&mut self, ctx: &CallContext, vote_id: VoteId) -> GovernanceResult<ExecutionReport> {
        let vote = self.votes.get(vote_id)?.clone();
        let tally_date = vote.tally_date.ok_or(GovernanceError::NotTallied(vote_id))?;
        if self.rounds.latest(&vote.identifier_hash) != Some(vote_id) {
            return Err(GovernanceError::MustBeFinalRound(vote_id));
        }
        if vote.executed {
            return Err(GovernanceError::AlreadyExecuted(vote_id));
        }
        let delay = self.config.settlement_delay.saturating_mul(Timestamp::from(vote.round));
        if ctx.timestamp.saturating_sub(tally_date) < delay {
            return Err(GovernanceError::SettlementDelayNotElapsed(vote_id));
        }

        let round_fees = self.round_fees(&vote.identifier_hash)?;
        let dispute = if vote.is_dispute {
            Some(self.disputes.get(vote_id).cloned().ok_or(GovernanceError::InvalidVoteId(vote_id))?)
        } else {
            None
        };
        let plan = match &dispute {
            Some(dispute) => settle_dispute(vote.result, &round_fees, dispute.disputed_reporter, dispute.slashed_amount)?,
            None => settle_proposal(
                vote.result,
                &round_fees,
                self.config.proposal_fee_policy,
                self.config.team_multisig,
            )?,
        };
        let governance = self.config.governance_address;
        let needed = plan.total()?;
        let available = self.env.balance_of(&governance);
        if available < needed {
            return Err(LedgerError::InsufficientBalance { needed, available }.into());
        }

        let action = match (&vote.action, vote.result) {
            (Some(call), VoteResult::Passed) => Some(self.dispatcher.dispatch(call, &mut self.env, governance)?),
            _ => None,
        };
        self.env.transfer_batch(governance, &plan.payouts)?;
        let value_status_applied = match &dispute {
            Some(dispute) => self.apply_value_outcome(vote_id, dispute, &plan),
            None => true,
        };

        if dispute.is_none() && vote.result != VoteResult::Passed {
            warn!(
                "Proposal {} ended {:?}; fees handled as {:?}",
                vote_id, vote.result, self.config.proposal_fee_policy
            );
        }
        if let Some(dispute) = &dispute {
            self.disputes.close(&dispute.query_id);
        }
        self.votes.get_mut(vote_id)?.executed = true;
        info!(
            "Vote {} executed ({:?}), paid {} to {} recipients",
            vote_id,
            vote.result,
            needed,
            plan.payouts.len()
        );
        Ok(ExecutionReport {
            vote_id,
            result: vote.result,
            payouts: plan.payouts,
            action,
            value_status_applied,
        })
    }

    /// Directly set user-list membership. Only the governance address itself
    /// may call this; everyone else goes through a proposal.
    pub fn update_user_list(&mut self, ctx: &CallContext, user: Address, is_user: bool) -> GovernanceResult<()> {
        if ctx.caller != self.config.governance_address {
            return Err(GovernanceError::Unauthorized(hex::encode(ctx.caller)));
        }
        self.dispatcher.set_user(user, is_user);
        Ok(())
    }

    /// Round-1 snapshot of the report disputed by `vote_id`.
    pub fn get_dispute_info(&self, vote_id: VoteId) -> GovernanceResult<&Dispute> {
        self.disputes.get(vote_id).ok_or(GovernanceError::InvalidVoteId(vote_id))
    }

    /// Unexecuted dispute lineages on `query_id`.
    pub fn get_open_disputes_on_id(&self, query_id: &QueryId) -> u64 {
        self.disputes.open_disputes_on_id(query_id)
    }

    /// Get a vote by id.
    pub fn get_vote_info(&self, vote_id: VoteId) -> GovernanceResult<&Vote> {
        self.votes.get(vote_id)
    }

    /// Vote ids of every round in the lineage `hash`, oldest first.
    pub fn get_vote_rounds(&self, hash: &Hash) -> &[VoteId] {
        self.rounds.rounds(hash)
    }

    /// Number of votes opened so far.
    pub fn get_vote_count(&self) -> u64 {
        self.votes.vote_count()
    }

    /// Number of ballots `voter` has cast.
    pub fn get_vote_tally_by_address(&self, voter: &Address) -> u64 {
        self.votes.vote_tally_by_address(voter)
    }

    /// Whether `voter` has voted on `vote_id`.
    pub fn did_vote(&self, vote_id: VoteId, voter: &Address) -> bool {
        self.votes.did_vote(vote_id, voter)
    }

    /// Whether `address` is on the user list.
    pub fn is_user(&self, address: &Address) -> bool {
        self.dispatcher.is_user(address)
    }

    /// First-round vote ids of the disputes against `reporter`.
    pub fn get_disputes_by_reporter(&self, reporter: &Address) -> &[VoteId] {
        self.disputes.disputes_by_reporter(reporter)
    }

    /// Current round-1 dispute fee.
    pub fn dispute_fee(&self) -> Amount {
        base_dispute_fee(self.env.stake_amount(), self.config.min_dispute_fee)
    }

    /// Get governance statistics.
    pub fn stats(&self) -> GovernanceStats {
        let mut stats = GovernanceStats::default();
        for vote_id in 1..=self.votes.vote_count() {
            let vote = match self.votes.get(vote_id) {
                Ok(vote) => vote,
                Err(_) => continue,
            };
            stats.total_votes += 1;
            if vote.is_dispute {
                stats.dispute_votes += 1;
            } else {
                stats.proposal_votes += 1;
            }
            match vote.result {
                VoteResult::Pending => stats.pending_votes += 1,
                VoteResult::Passed => stats.passed_votes += 1,
                VoteResult::Failed => stats.failed_votes += 1,
                VoteResult::Invalid => stats.invalid_votes += 1,
            }
            if vote.executed {
                stats.executed_votes += 1;
            }
        }
        stats
    }

    fn open_vote(
        &mut self,
        ctx: &CallContext,
        hash: Hash,
        round: u32,
        fee: Amount,
        is_dispute: bool,
        action: Option<ActionCall>,
    ) -> VoteId {
        let vote_id = self.votes.open(Vote {
            identifier_hash: hash,
            round,
            start_date: ctx.timestamp,
            block_number: ctx.block_number,
            fee,
            tally_date: None,
            executed: false,
            is_dispute,
            result: VoteResult::Pending,
            tallies: VoteTallies::default(),
            initiator: ctx.caller,
            action,
        });
        self.rounds.push(hash, vote_id);
        vote_id
    }

    /// A new round needs the previous one tallied, not executed, and still
    /// inside the escalation window.
    fn check_escalation(&self, hash: &Hash, now: Timestamp) -> GovernanceResult<()> {
        let previous_id = self.rounds.latest(hash).ok_or(GovernanceError::UnknownLineage)?;
        let previous = self.votes.get(previous_id)?;
        let tally_date = previous.tally_date.ok_or(GovernanceError::PreviousRoundNotTallied)?;
        if previous.executed {
            return Err(GovernanceError::AlreadyExecuted(previous_id));
        }
        if now.saturating_sub(tally_date) >= self.config.escalation_window {
            warn!(
                "Escalation of lineage {} rejected: round {} tallied at {}, now {}",
                hex::encode(hash),
                previous.round,
                tally_date,
                now
            );
            return Err(GovernanceError::EscalationWindowExpired);
        }
        Ok(())
    }

    /// Collects the fee, escrows the reporter's stake and only then hides
    /// the value. A failure after the fee moved hands back what was taken.
    fn open_first_round(
        &mut self,
        payer: Address,
        fee: Amount,
        query_id: &QueryId,
        timestamp: Timestamp,
        reporter: Address,
        stake_amount: Amount,
    ) -> GovernanceResult<Amount> {
        let governance = self.config.governance_address;
        self.env.transfer_from(governance, payer, governance, fee)?;
        let escrow = stake_amount.min(self.env.reporter_stake(&reporter));
        let slashed = match self.env.slash(governance, reporter, escrow, governance) {
            Ok(slashed) => slashed,
            Err(e) => {
                self.roll_back_first_round(payer, fee, reporter, 0);
                return Err(e.into());
            }
        };
        if let Err(e) = self.env.mark_disputed(governance, query_id, timestamp) {
            self.roll_back_first_round(payer, fee, reporter, slashed);
            return Err(e.into());
        }
        Ok(slashed)
    }

    fn roll_back_first_round(&mut self, payer: Address, fee: Amount, reporter: Address, slashed: Amount) {
        let governance = self.config.governance_address;
        if let Err(e) = self.env.transfer(governance, payer, fee) {
            warn!("Dispute fee {} not refunded to {}: {}", fee, hex::encode(payer), e);
        }
        if slashed > 0 {
            if let Err(e) = self.env.restore_stake(governance, reporter, slashed) {
                warn!("Stake {} not restored to {}: {}", slashed, hex::encode(reporter), e);
            }
        }
        debug!("Rolled back round-1 dispute by {}", hex::encode(payer));
    }

    fn ensure_can_pay(&self, payer: &Address, fee: Amount) -> GovernanceResult<()> {
        let available = self.env.balance_of(payer);
        if available < fee {
            return Err(GovernanceError::InsufficientBalance { needed: fee, available });
        }
        let allowed = self.env.allowance(payer, &self.config.governance_address);
        if allowed < fee {
            return Err(GovernanceError::InsufficientAllowance { needed: fee, available: allowed });
        }
        Ok(())
    }

    fn disputed_query(&self, vote_id: VoteId, is_dispute: bool) -> Option<QueryId> {
        if is_dispute {
            self.disputes.get(vote_id).map(|dispute| dispute.query_id)
        } else {
            None
        }
    }

    fn ballot_weights(&self, vote_id: VoteId, voter: &Address) -> GovernanceResult<VoterWeights> {
        let vote = self.votes.ensure_can_vote(vote_id, voter)?;
        let disputed_query = self.disputed_query(vote_id, vote.is_dispute);
        Ok(VoterWeights::compute(
            &self.env,
            voter,
            disputed_query.as_ref(),
            &self.config.team_multisig,
        ))
    }

    fn round_fees(&self, hash: &Hash) -> GovernanceResult<Vec<RoundFee>> {
        self.rounds
            .rounds(hash)
            .iter()
            .map(|vote_id| {
                self.votes.get(*vote_id).map(|vote| RoundFee { initiator: vote.initiator, fee: vote.fee })
            })
            .collect()
    }

    /// Best effort: the oracle may no longer accept this governance.
    fn apply_value_outcome(&mut self, vote_id: VoteId, dispute: &Dispute, plan: &SettlementPlan) -> bool {
        let governance = self.config.governance_address;
        let applied = match plan.value_outcome {
            Some(ValueOutcome::Invalidate) => self.env.invalidate_value(governance, &dispute.query_id, dispute.timestamp),
            Some(ValueOutcome::Restore) => self.env.mark_resolved(governance, &dispute.query_id, dispute.timestamp),
            Some(ValueOutcome::KeepDisputed) | None => Ok(()),
        };
        match applied {
            Ok(()) => true,
            Err(e) => {
                warn!("Value status for dispute {} not updated: {}", vote_id, e);
                false
            }
        }
    }
}
