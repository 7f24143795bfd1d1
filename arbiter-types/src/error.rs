use thiserror::Error;

use crate::{Amount, Selector};

/// Failures reported by the external collaborators (oracle, token, tips).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("Insufficient allowance: needed {needed}, available {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    #[error("Caller {0} is not authorized for this call")]
    Unauthorized(String),

    #[error("No value exists at the given query id and timestamp")]
    NoValue,

    #[error("A value was already reported at this timestamp")]
    TimestampTaken,

    #[error("Reporter stake below the required amount")]
    InsufficientStake,

    #[error("Reporter is still in the reporting lock")]
    ReportingLocked,

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Failures while encoding or decoding a governance action payload.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unknown action selector {}", hex::encode(.0))]
    UnknownSelector(Selector),

    #[error("Payload codec error: {0}")]
    Codec(#[from] bincode::Error),
}
