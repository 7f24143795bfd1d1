//! Data structures for disputes, votes and governance proposals.

use serde::{Deserialize, Serialize};

use crate::{selector_for, ActionError, Address, Amount, BlockNumber, Hash, QueryId, Selector, Timestamp};

/// A challenged report. Fixed when round 1 of its lineage opens and copied
/// unchanged into every later round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub query_id: QueryId,
    pub timestamp: Timestamp,
    /// Snapshot of the disputed value.
    pub value: Vec<u8>,
    pub disputed_reporter: Address,
    /// Reporter stake moved into escrow when round 1 opened.
    pub slashed_amount: Amount,
}

/// Outcome of a tallied vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteResult {
    Pending,
    Passed,
    Failed,
    Invalid,
}

impl Default for VoteResult {
    fn default() -> Self {
        VoteResult::Pending
    }
}

/// The four stakeholder classes whose votes are tallied separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constituency {
    Tokenholders,
    Users,
    Reporters,
    TeamMultisig,
}

impl Constituency {
    pub const ALL: [Constituency; 4] = [
        Constituency::Tokenholders,
        Constituency::Users,
        Constituency::Reporters,
        Constituency::TeamMultisig,
    ];
}

/// A single ballot choice. Invalid takes precedence over support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Support,
    Against,
    InvalidQuery,
}

impl VoteChoice {
    pub fn from_flags(supports: bool, invalid_query: bool) -> Self {
        if invalid_query {
            VoteChoice::InvalidQuery
        } else if supports {
            VoteChoice::Support
        } else {
            VoteChoice::Against
        }
    }
}

/// Accumulated weight per choice for one constituency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub does_support: Amount,
    pub against: Amount,
    pub invalid_query: Amount,
}

impl Tally {
    pub fn add(&mut self, choice: VoteChoice, weight: Amount) {
        let bucket = match choice {
            VoteChoice::Support => &mut self.does_support,
            VoteChoice::Against => &mut self.against,
            VoteChoice::InvalidQuery => &mut self.invalid_query,
        };
        *bucket = bucket.saturating_add(weight);
    }

    pub fn total(&self) -> Amount {
        self.does_support
            .saturating_add(self.against)
            .saturating_add(self.invalid_query)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTallies {
    pub tokenholders: Tally,
    pub users: Tally,
    pub reporters: Tally,
    pub team_multisig: Tally,
}

impl VoteTallies {
    pub fn get(&self, constituency: Constituency) -> &Tally {
        match constituency {
            Constituency::Tokenholders => &self.tokenholders,
            Constituency::Users => &self.users,
            Constituency::Reporters => &self.reporters,
            Constituency::TeamMultisig => &self.team_multisig,
        }
    }

    pub fn get_mut(&mut self, constituency: Constituency) -> &mut Tally {
        match constituency {
            Constituency::Tokenholders => &mut self.tokenholders,
            Constituency::Users => &mut self.users,
            Constituency::Reporters => &mut self.reporters,
            Constituency::TeamMultisig => &mut self.team_multisig,
        }
    }
}

/// An encoded call executed when a proposal passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCall {
    pub target: Address,
    pub selector: Selector,
    pub payload: Vec<u8>,
}

/// One round of a dispute or proposal lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Lineage hash shared by every round of the same dispute or proposal.
    pub identifier_hash: Hash,
    pub round: u32,
    pub start_date: Timestamp,
    pub block_number: BlockNumber,
    pub fee: Amount,
    pub tally_date: Option<Timestamp>,
    pub executed: bool,
    pub is_dispute: bool,
    pub result: VoteResult,
    pub tallies: VoteTallies,
    pub initiator: Address,
    /// Present for proposals only.
    pub action: Option<ActionCall>,
}

impl Vote {
    pub fn is_tallied(&self) -> bool {
        self.tally_date.is_some()
    }
}

/// Governance actions a proposal can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceAction {
    ChangeStakeAmount(Amount),
    ChangeReportingLock(Timestamp),
    ChangeGovernanceAddress(Address),
    UpdateUserList { user: Address, is_user: bool },
}

const CHANGE_STAKE_AMOUNT_SIG: &str = "changeStakeAmount(uint256)";
const CHANGE_REPORTING_LOCK_SIG: &str = "changeReportingLock(uint256)";
const CHANGE_GOVERNANCE_ADDRESS_SIG: &str = "changeGovernanceAddress(address)";
const UPDATE_USER_LIST_SIG: &str = "updateUserList(address,bool)";

impl GovernanceAction {
    pub fn signature(&self) -> &'static str {
        match self {
            GovernanceAction::ChangeStakeAmount(_) => CHANGE_STAKE_AMOUNT_SIG,
            GovernanceAction::ChangeReportingLock(_) => CHANGE_REPORTING_LOCK_SIG,
            GovernanceAction::ChangeGovernanceAddress(_) => CHANGE_GOVERNANCE_ADDRESS_SIG,
            GovernanceAction::UpdateUserList { .. } => UPDATE_USER_LIST_SIG,
        }
    }

    pub fn selector(&self) -> Selector {
        selector_for(self.signature())
    }

    /// Whether the action targets the governance contract itself rather
    /// than the oracle.
    pub fn targets_governance(&self) -> bool {
        matches!(self, GovernanceAction::UpdateUserList { .. })
    }

    /// Canonical bincode encoding of the call arguments.
    pub fn encode_payload(&self) -> Result<Vec<u8>, ActionError> {
        let payload = match self {
            GovernanceAction::ChangeStakeAmount(amount) => bincode::serialize(amount)?,
            GovernanceAction::ChangeReportingLock(lock) => bincode::serialize(lock)?,
            GovernanceAction::ChangeGovernanceAddress(address) => bincode::serialize(address)?,
            GovernanceAction::UpdateUserList { user, is_user } => bincode::serialize(&(user, is_user))?,
        };
        Ok(payload)
    }

    /// Rebuilds an action from its selector and payload.
    pub fn decode(selector: &Selector, payload: &[u8]) -> Result<Self, ActionError> {
        if *selector == selector_for(CHANGE_STAKE_AMOUNT_SIG) {
            Ok(GovernanceAction::ChangeStakeAmount(bincode::deserialize(payload)?))
        } else if *selector == selector_for(CHANGE_REPORTING_LOCK_SIG) {
            Ok(GovernanceAction::ChangeReportingLock(bincode::deserialize(payload)?))
        } else if *selector == selector_for(CHANGE_GOVERNANCE_ADDRESS_SIG) {
            Ok(GovernanceAction::ChangeGovernanceAddress(bincode::deserialize(payload)?))
        } else if *selector == selector_for(UPDATE_USER_LIST_SIG) {
            let (user, is_user): (Address, bool) = bincode::deserialize(payload)?;
            Ok(GovernanceAction::UpdateUserList { user, is_user })
        } else {
            Err(ActionError::UnknownSelector(*selector))
        }
    }
}
