//! Settlement plans for executed disputes and proposals.
//!
//! A plan is computed in full before anything is paid, so execution either
//! applies all of it through one batch transfer or none of it.

use primitive_types::U256;

use arbiter_types::{Address, Amount, VoteResult};

use crate::config::ProposalFeePolicy;
use crate::error::{GovernanceError, GovernanceResult};

/// Fee paid by the initiator of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundFee {
    pub initiator: Address,
    pub fee: Amount,
}

/// What the oracle should do with the disputed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOutcome {
    /// Dispute passed: the value is permanently invalid.
    Invalidate,
    /// Dispute failed: the value is valid again.
    Restore,
    /// Dispute was invalid: the value stays flagged as disputed.
    KeepDisputed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Recipients in first-seen order, each listed once.
    pub payouts: Vec<(Address, Amount)>,
    pub value_outcome: Option<ValueOutcome>,
}

impl SettlementPlan {
    pub fn total(&self) -> GovernanceResult<Amount> {
        self.payouts
            .iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(GovernanceError::Overflow)
    }

    fn pay(&mut self, recipient: Address, amount: Amount) -> GovernanceResult<()> {
        if amount == 0 {
            return Ok(());
        }
        match self.payouts.iter_mut().find(|(address, _)| *address == recipient) {
            Some((_, existing)) => {
                *existing = existing.checked_add(amount).ok_or(GovernanceError::Overflow)?;
            }
            None => self.payouts.push((recipient, amount)),
        }
        Ok(())
    }
}

fn total_fees(rounds: &[RoundFee]) -> GovernanceResult<Amount> {
    rounds
        .iter()
        .try_fold(0 as Amount, |acc, round| acc.checked_add(round.fee))
        .ok_or(GovernanceError::Overflow)
}

/// `amount * part / whole`, rounded down; `whole` must be non-zero and
/// `part <= whole`.
fn pro_rata(amount: Amount, part: Amount, whole: Amount) -> Amount {
    (U256::from(amount) * U256::from(part) / U256::from(whole)).low_u128()
}

/// Splits the escrowed stake and fees of a dispute lineage.
///
/// `rounds` is ordered from round 1; `slashed` is the reporter stake
/// escrowed when round 1 opened.
pub fn settle_dispute(
    result: VoteResult,
    rounds: &[RoundFee],
    reporter: Address,
    slashed: Amount,
) -> GovernanceResult<SettlementPlan> {
    let fees = total_fees(rounds)?;
    let mut plan = SettlementPlan::default();
    match result {
        VoteResult::Passed => {
            let mut distributed: Amount = 0;
            for round in rounds {
                let share = if fees == 0 { 0 } else { pro_rata(slashed, round.fee, fees) };
                distributed += share;
                plan.pay(round.initiator, round.fee.checked_add(share).ok_or(GovernanceError::Overflow)?)?;
            }
            // Rounding dust and the zero-fee case go to whoever opened the dispute.
            if let Some(first) = rounds.first() {
                plan.pay(first.initiator, slashed - distributed)?;
            }
            plan.value_outcome = Some(ValueOutcome::Invalidate);
        }
        VoteResult::Failed => {
            plan.pay(reporter, slashed.checked_add(fees).ok_or(GovernanceError::Overflow)?)?;
            plan.value_outcome = Some(ValueOutcome::Restore);
        }
        VoteResult::Invalid | VoteResult::Pending => {
            plan.pay(reporter, slashed)?;
            for round in rounds {
                plan.pay(round.initiator, round.fee)?;
            }
            plan.value_outcome = Some(ValueOutcome::KeepDisputed);
        }
    }
    Ok(plan)
}

/// Returns or forfeits the fees of a proposal lineage.
pub fn settle_proposal(
    result: VoteResult,
    rounds: &[RoundFee],
    policy: ProposalFeePolicy,
    team_multisig: Address,
) -> GovernanceResult<SettlementPlan> {
    let mut plan = SettlementPlan::default();
    let refund = |plan: &mut SettlementPlan| -> GovernanceResult<()> {
        for round in rounds {
            plan.pay(round.initiator, round.fee)?;
        }
        Ok(())
    };
    match (result, policy) {
        (VoteResult::Passed, _) | (_, ProposalFeePolicy::Refund) => refund(&mut plan)?,
        (_, ProposalFeePolicy::ForfeitToMultisig) => plan.pay(team_multisig, total_fees(rounds)?)?,
        (_, ProposalFeePolicy::Retain) => {}
    }
    Ok(plan)
}
