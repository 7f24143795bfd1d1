mod common;

use arbiter_governance::{ErrorKind, GovernanceCoordinator, GovernanceError, ProposalFeePolicy};
use arbiter_ledger::ReportStatus;
use arbiter_types::{
    proposal_hash, query_id_from_u64, selector_for, Address, GovernanceAction, StakeLedger, Timestamp, VoteResult,
    DAY,
};

use common::*;

const PROPOSED_AT: Timestamp = T0 + 100;
const TALLIED_AT: Timestamp = PROPOSED_AT + 7 * DAY;
const NEW_GOV: Address = [0x61; 20];

#[test]
fn test_passed_stake_amount_proposal_is_applied_and_refunded() {
    let mut gov = deploy();
    let id = gov.propose_change_stake_amount(&at(ALICE, PROPOSED_AT), 200, 0).unwrap();
    let vote = gov.get_vote_info(id).unwrap();
    assert!(!vote.is_dispute);
    assert_eq!(vote.fee, FEE);
    let call = vote.action.clone().unwrap();
    assert_eq!(call.target, ORACLE);
    assert_eq!(call.selector, selector_for("changeStakeAmount(uint256)"));
    assert_eq!(
        vote.identifier_hash,
        proposal_hash(&call.target, &call.selector, &call.payload, PROPOSED_AT)
    );
    assert_eq!(balance(&gov, &ALICE), INITIAL_BALANCE - FEE);

    gov.vote(&at(ALICE, PROPOSED_AT + 60), id, true, false).unwrap();
    // Proposals run for a week.
    assert!(matches!(
        gov.tally_votes(&at(BOB, PROPOSED_AT + 2 * DAY), id),
        Err(GovernanceError::VotingStillOpen(_))
    ));
    assert_eq!(gov.tally_votes(&at(BOB, TALLIED_AT), id).unwrap(), VoteResult::Passed);

    let report = gov.execute_vote(&at(BOB, TALLIED_AT + DAY), id).unwrap();
    assert_eq!(report.action, Some(GovernanceAction::ChangeStakeAmount(200)));
    assert_eq!(report.payouts, vec![(ALICE, FEE)]);
    assert_eq!(gov.env().stake_amount(), 200);
    assert_eq!(balance(&gov, &ALICE), INITIAL_BALANCE);
    assert_eq!(gov.dispute_fee(), 20);
}

#[test]
fn test_stake_change_mid_dispute_keeps_escrowed_stakes() {
    let witness: Address = [0x05; 20];
    let mut gov = deploy();
    let proposal = gov.propose_change_stake_amount(&at(ALICE, PROPOSED_AT), 500, 0).unwrap();
    gov.vote(&at(ALICE, PROPOSED_AT + 60), proposal, true, false).unwrap();
    gov.tally_votes(&at(BOB, TALLIED_AT), proposal).unwrap();

    // Three staked reporters each submit one value; a fourth stays clean.
    for reporter in [BOB, CAROL] {
        gov.env_mut().deposit_stake(reporter, STAKE).unwrap();
    }
    gov.env_mut().mint(witness, INITIAL_BALANCE).unwrap();
    gov.env_mut().deposit_stake(witness, STAKE).unwrap();
    let reported_at = TALLIED_AT + 10;
    let queries = [query_id_from_u64(1), query_id_from_u64(2), query_id_from_u64(3)];
    for (query_id, reporter) in queries.iter().zip([REPORTER, BOB, CAROL]) {
        submit(&mut gov, reporter, *query_id, reported_at);
    }

    let opened_at = reported_at + 10;
    let disputes: Vec<_> = queries
        .iter()
        .map(|query_id| gov.begin_dispute(&at(ALICE, opened_at), *query_id, reported_at).unwrap())
        .collect();
    assert_eq!(disputes, vec![2, 3, 4]);
    assert_eq!(gov.env().total_stakers(), 1);

    // The witness's reporter weight decides the first dispute.
    gov.vote(&at(ALICE, opened_at + 60), disputes[0], true, false).unwrap();
    gov.vote(&at(BOB, opened_at + 60), disputes[0], true, false).unwrap();
    gov.vote(&at(witness, opened_at + 60), disputes[0], false, false).unwrap();
    gov.vote(&at(MULTISIG, opened_at + 60), disputes[1], true, false).unwrap();

    let report = gov.execute_vote(&at(BOB, TALLIED_AT + DAY), proposal).unwrap();
    assert_eq!(report.action, Some(GovernanceAction::ChangeStakeAmount(500)));
    assert_eq!(gov.env().stake_amount(), 500);
    assert_eq!(gov.env().total_stakers(), 0);
    assert_eq!(gov.dispute_fee(), 50);

    let tallied_at = opened_at + 2 * DAY;
    let results: Vec<_> = disputes
        .iter()
        .map(|id| gov.tally_votes(&at(BOB, tallied_at), *id).unwrap())
        .collect();
    assert_eq!(results, vec![VoteResult::Failed, VoteResult::Passed, VoteResult::Invalid]);

    let payouts: Vec<_> = disputes
        .iter()
        .map(|id| gov.execute_vote(&at(BOB, tallied_at + DAY), *id).unwrap().payouts)
        .collect();
    assert_eq!(
        payouts,
        vec![
            vec![(REPORTER, STAKE + FEE)],
            vec![(ALICE, FEE + STAKE)],
            vec![(CAROL, STAKE), (ALICE, FEE)],
        ]
    );
    assert_eq!(balance(&gov, &ALICE), INITIAL_BALANCE + STAKE);
    assert_eq!(balance(&gov, &REPORTER), INITIAL_BALANCE + FEE);
    assert_eq!(balance(&gov, &BOB), INITIAL_BALANCE - STAKE);
    assert_eq!(balance(&gov, &CAROL), INITIAL_BALANCE);
    assert_eq!(balance(&gov, &GOV), 0);
    for query_id in &queries {
        assert_eq!(gov.get_open_disputes_on_id(query_id), 0);
    }
}

#[test]
fn test_rejected_proposal_forfeits_fee_to_multisig() {
    let mut gov = deploy();
    let id = gov.propose_change_reporting_lock(&at(BOB, PROPOSED_AT), 3_600, 0).unwrap();
    gov.vote(&at(MULTISIG, PROPOSED_AT + 60), id, false, false).unwrap();
    assert_eq!(gov.tally_votes(&at(BOB, TALLIED_AT), id).unwrap(), VoteResult::Failed);

    let report = gov.execute_vote(&at(BOB, TALLIED_AT + DAY), id).unwrap();
    assert_eq!(report.action, None);
    assert_eq!(report.payouts, vec![(MULTISIG, FEE)]);
    assert_eq!(gov.env().reporting_lock(), REPORTING_LOCK);
    assert_eq!(balance(&gov, &MULTISIG), INITIAL_BALANCE + FEE);
    assert_eq!(balance(&gov, &BOB), INITIAL_BALANCE - FEE);
}

#[test]
fn test_refund_policy_returns_fees_on_invalid_proposal() {
    let mut gov = deploy_with(STAKE, |config| config.proposal_fee_policy = ProposalFeePolicy::Refund);
    let id = gov.propose_change_reporting_lock(&at(BOB, PROPOSED_AT), 3_600, 0).unwrap();
    assert_eq!(gov.tally_votes(&at(BOB, TALLIED_AT), id).unwrap(), VoteResult::Invalid);
    let report = gov.execute_vote(&at(BOB, TALLIED_AT + DAY), id).unwrap();
    assert_eq!(report.payouts, vec![(BOB, FEE)]);
    assert_eq!(balance(&gov, &BOB), INITIAL_BALANCE);
}

#[test]
fn test_retain_policy_keeps_fees_in_escrow() {
    let mut gov = deploy_with(STAKE, |config| config.proposal_fee_policy = ProposalFeePolicy::Retain);
    let id = gov.propose_change_reporting_lock(&at(BOB, PROPOSED_AT), 3_600, 0).unwrap();
    gov.tally_votes(&at(BOB, TALLIED_AT), id).unwrap();
    let report = gov.execute_vote(&at(BOB, TALLIED_AT + DAY), id).unwrap();
    assert!(report.payouts.is_empty());
    assert_eq!(balance(&gov, &GOV), FEE);
}

#[test]
fn test_proposal_escalation_names_first_round_timestamp() {
    let mut gov = deploy();
    let first = gov.propose_change_reporting_lock(&at(BOB, PROPOSED_AT), 3_600, 0).unwrap();
    gov.tally_votes(&at(BOB, TALLIED_AT), first).unwrap();

    let err = gov
        .propose_change_reporting_lock(&at(ALICE, TALLIED_AT + 60), 3_600, PROPOSED_AT + 1)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::UnknownLineage));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let second = gov
        .propose_change_reporting_lock(&at(ALICE, TALLIED_AT + 60), 3_600, PROPOSED_AT)
        .unwrap();
    let vote = gov.get_vote_info(second).unwrap();
    assert_eq!(vote.round, 2);
    assert_eq!(vote.fee, 2 * FEE);
    let hash = vote.identifier_hash;
    assert_eq!(gov.get_vote_rounds(&hash), &[first, second]);

    gov.vote(&at(ALICE, TALLIED_AT + 120), second, true, false).unwrap();
    let second_tally = TALLIED_AT + 60 + 7 * DAY;
    gov.tally_votes(&at(BOB, second_tally), second).unwrap();
    assert!(matches!(
        gov.execute_vote(&at(BOB, second_tally + 5 * DAY), first),
        Err(GovernanceError::MustBeFinalRound(_))
    ));
    assert!(matches!(
        gov.execute_vote(&at(BOB, second_tally + DAY), second),
        Err(GovernanceError::SettlementDelayNotElapsed(_))
    ));
    let report = gov.execute_vote(&at(BOB, second_tally + 2 * DAY), second).unwrap();
    assert_eq!(report.action, Some(GovernanceAction::ChangeReportingLock(3_600)));
    assert_eq!(report.payouts, vec![(BOB, FEE), (ALICE, 2 * FEE)]);
    assert_eq!(gov.env().reporting_lock(), 3_600);
}

#[test]
fn test_user_list_changes_only_through_proposals() {
    let mut gov = deploy();
    let err = gov.update_user_list(&at(ALICE, PROPOSED_AT), CAROL, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let id = gov.propose_update_user_list(&at(ALICE, PROPOSED_AT), CAROL, true, 0).unwrap();
    assert_eq!(gov.get_vote_info(id).unwrap().action.as_ref().map(|call| call.target), Some(GOV));
    gov.vote(&at(ALICE, PROPOSED_AT + 60), id, true, false).unwrap();
    gov.tally_votes(&at(BOB, TALLIED_AT), id).unwrap();
    assert!(!gov.is_user(&CAROL));
    let report = gov.execute_vote(&at(BOB, TALLIED_AT + DAY), id).unwrap();
    assert_eq!(report.action, Some(GovernanceAction::UpdateUserList { user: CAROL, is_user: true }));
    assert!(gov.is_user(&CAROL));
}

#[test]
fn test_restricted_governance_proposals() {
    let mut gov = deploy_with(STAKE, |config| config.restrict_governance_proposals = true);
    let err = gov
        .propose_change_governance_address(&at(BOB, PROPOSED_AT), NEW_GOV, 0)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::Unauthorized(_)));
    assert_eq!(balance(&gov, &BOB), INITIAL_BALANCE);

    // Other actions stay open to everyone.
    gov.propose_change_stake_amount(&at(BOB, PROPOSED_AT), 200, 0).unwrap();
    gov.propose_change_governance_address(&at(MULTISIG, PROPOSED_AT), NEW_GOV, 0).unwrap();
    gov.update_user_list(&at(GOV, PROPOSED_AT), CAROL, true).unwrap();
    gov.propose_change_governance_address(&at(CAROL, PROPOSED_AT + 1), NEW_GOV, 0).unwrap();
}

#[test]
fn test_governance_handoff() {
    let mut gov = deploy_with_report();
    let dispute = gov.begin_dispute(&at(ALICE, T0 + 10), query(), T0).unwrap();
    gov.vote(&at(ALICE, T0 + 60), dispute, true, false).unwrap();
    let proposal = gov
        .propose_change_governance_address(&at(BOB, PROPOSED_AT), NEW_GOV, 0)
        .unwrap();
    gov.vote(&at(BOB, PROPOSED_AT + 60), proposal, true, false).unwrap();
    gov.tally_votes(&at(BOB, T0 + 10 + 2 * DAY), dispute).unwrap();
    gov.tally_votes(&at(BOB, TALLIED_AT), proposal).unwrap();

    let now = TALLIED_AT + DAY;
    let report = gov.execute_vote(&at(BOB, now), proposal).unwrap();
    assert_eq!(report.action, Some(GovernanceAction::ChangeGovernanceAddress(NEW_GOV)));
    assert_eq!(gov.env().governance_address(), NEW_GOV);

    // The pending dispute still settles, but the oracle ignores this engine now.
    let report = gov.execute_vote(&at(BOB, now), dispute).unwrap();
    assert_eq!(report.result, VoteResult::Passed);
    assert!(!report.value_status_applied);
    assert_eq!(report.payouts, vec![(ALICE, FEE + STAKE)]);
    assert_eq!(gov.env().report_status(&query(), T0), Some(ReportStatus::Disputed));

    // New disputes through the old engine are rejected by the oracle.
    gov.env_mut().deposit_stake(CAROL, STAKE).unwrap();
    submit(&mut gov, CAROL, query(), now);
    let err = gov.begin_dispute(&at(ALICE, now + 10), query(), now).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalCallFailed);
    assert_eq!(gov.get_vote_count(), 2);
    assert_eq!(balance(&gov, &ALICE), INITIAL_BALANCE + STAKE);

    // A successor over the same chain takes over.
    let mut chain = gov.into_env();
    chain.approve(ALICE, NEW_GOV, FEE);
    let mut successor = GovernanceCoordinator::new(config(NEW_GOV), chain).unwrap();
    let id = successor.begin_dispute(&at(ALICE, now + 10), query(), now).unwrap();
    assert_eq!(id, 1);
    assert_eq!(balance(&successor, &NEW_GOV), FEE + STAKE);
    assert_eq!(successor.env().report_status(&query(), now), Some(ReportStatus::Disputed));
}
