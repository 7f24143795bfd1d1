//! Shared types for the Arbiter dispute and governance engine.
//!
//! Identifiers, on-chain records, encoded governance actions and the
//! interfaces of the external collaborators (value store, stake ledger,
//! tip ledger and token ledger) live here so that both the engine and the
//! in-memory ledger can depend on them.

use serde::{Deserialize, Serialize};

pub mod error;
pub mod governance;
pub mod interfaces;

pub use error::{ActionError, LedgerError};
pub use governance::*;
pub use interfaces::{OracleEnvironment, StakeLedger, TipLedger, TokenLedger, ValueStore};

pub type Address = [u8; 20];
pub type Hash = [u8; 32];
pub type QueryId = [u8; 32];
pub type Selector = [u8; 4];
pub type Amount = u128;
pub type Timestamp = u64;
pub type BlockNumber = u64;
pub type VoteId = u64;

/// Seconds in one day.
pub const DAY: Timestamp = 86_400;

/// Fixed-point precision used for token amounts and normalized vote shares.
pub const PRECISION: Amount = 1_000_000_000_000_000_000;

pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Caller identity and block environment of a state-changing call.
///
/// Every operation is applied as one serialized transaction; the context
/// fixes who submitted it and when it was included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub timestamp: Timestamp,
    pub block_number: BlockNumber,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp, block_number: BlockNumber) -> Self {
        Self { caller, timestamp, block_number }
    }

    /// Same block, different sender.
    pub fn with_caller(&self, caller: Address) -> Self {
        Self { caller, ..*self }
    }
}

/// Lineage hash of a reported value: `blake3(query_id || timestamp)`.
pub fn report_hash(query_id: &QueryId, timestamp: Timestamp) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(query_id);
    hasher.update(&timestamp.to_be_bytes());
    hasher.finalize().into()
}

/// Lineage hash of a proposal:
/// `blake3(target || selector || payload || proposal_timestamp)`.
pub fn proposal_hash(
    target: &Address,
    selector: &Selector,
    payload: &[u8],
    timestamp: Timestamp,
) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(target);
    hasher.update(selector);
    hasher.update(payload);
    hasher.update(&timestamp.to_be_bytes());
    hasher.finalize().into()
}

/// First four bytes of the blake3 digest of a function signature.
pub fn selector_for(signature: &str) -> Selector {
    let digest = blake3::hash(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&digest.as_bytes()[..4]);
    selector
}

/// Right-aligns a small integer into a 32-byte query identifier.
pub fn query_id_from_u64(value: u64) -> QueryId {
    let mut id = [0u8; 32];
    id[24..].copy_from_slice(&value.to_be_bytes());
    id
}
