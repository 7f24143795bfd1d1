use thiserror::Error;

use arbiter_types::{ActionError, Amount, LedgerError, VoteId};

/// Coarse failure classes that off-chain tooling can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
    InsufficientFunds,
    Unauthorized,
    ExternalCallFailed,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Vote id {0} does not exist")]
    InvalidVoteId(VoteId),

    #[error("No proposal lineage exists for the given timestamp")]
    UnknownLineage,

    #[error("No value exists at the given query id and timestamp")]
    NoValueExists,

    #[error("Dispute must be started within the reporting lock time")]
    ReportingLockExpired,

    #[error("Previous round must be tallied before a new round starts")]
    PreviousRoundNotTallied,

    #[error("New round must be started within the escalation window")]
    EscalationWindowExpired,

    #[error("Vote {0} has already been tallied")]
    VotingClosed(VoteId),

    #[error("Sender has already voted on vote {0}")]
    AlreadyVoted(VoteId),

    #[error("Voting window for vote {0} is still open")]
    VotingStillOpen(VoteId),

    #[error("Vote {0} has already been tallied")]
    AlreadyTallied(VoteId),

    #[error("Vote {0} must be tallied before execution")]
    NotTallied(VoteId),

    #[error("Vote {0} is not the final round of its lineage")]
    MustBeFinalRound(VoteId),

    #[error("Vote {0} has already been executed")]
    AlreadyExecuted(VoteId),

    #[error("Settlement delay for vote {0} has not elapsed")]
    SettlementDelayNotElapsed(VoteId),

    #[error("Batch arguments must have equal lengths")]
    BatchLengthMismatch,

    #[error("Insufficient balance to pay fee: needed {needed}, available {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("Insufficient allowance to pay fee: needed {needed}, available {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    #[error("Caller is not authorized: {0}")]
    Unauthorized(String),

    #[error("External call failed: {0}")]
    ExternalCall(#[from] LedgerError),

    #[error("Governance action error: {0}")]
    Action(#[from] ActionError),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration storage error: {0}")]
    ConfigStore(#[from] confy::ConfyError),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::InvalidVoteId(_) | GovernanceError::UnknownLineage => ErrorKind::NotFound,
            GovernanceError::InsufficientBalance { .. } | GovernanceError::InsufficientAllowance { .. } => {
                ErrorKind::InsufficientFunds
            }
            GovernanceError::Unauthorized(_) => ErrorKind::Unauthorized,
            GovernanceError::ExternalCall(LedgerError::InsufficientBalance { .. })
            | GovernanceError::ExternalCall(LedgerError::InsufficientAllowance { .. }) => ErrorKind::InsufficientFunds,
            GovernanceError::ExternalCall(_) | GovernanceError::Action(_) | GovernanceError::ConfigStore(_) => {
                ErrorKind::ExternalCallFailed
            }
            _ => ErrorKind::PreconditionFailed,
        }
    }
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;
