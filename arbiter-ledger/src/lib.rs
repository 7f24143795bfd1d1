//! In-memory collaborators for the Arbiter dispute engine.
//!
//! [`InMemoryChain`] bundles a token, a staking oracle and a tip ledger and
//! implements every collaborator trait from `arbiter_types::interfaces`, so
//! a single value can be handed to the governance engine as its environment.

pub mod chain;
pub mod oracle;
pub mod tips;
pub mod token;

pub use chain::{ChainParams, InMemoryChain};
pub use oracle::{InMemoryOracle, Report, ReportStatus, StakerInfo};
pub use tips::InMemoryTips;
pub use token::InMemoryToken;
