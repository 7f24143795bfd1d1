//! Arbiter Governance System
//!
//! This crate implements dispute resolution and parameter governance for a
//! decentralized oracle: escalating dispute rounds, four-constituency
//! weighted voting, and settlement of escrowed stakes and fees.

pub mod config;
pub mod dispute_registry;
pub mod error;
pub mod fees;
pub mod governance_coordinator;
pub mod proposal_dispatcher;
pub mod settlement;
pub mod tally;
pub mod vote_engine;
pub mod vote_rounds;

pub use config::{GovernanceConfig, ProposalFeePolicy};
pub use dispute_registry::DisputeRegistry;
pub use error::{ErrorKind, GovernanceError, GovernanceResult};
pub use fees::{base_dispute_fee, round_fee};
pub use governance_coordinator::{ExecutionReport, GovernanceCoordinator, GovernanceStats};
pub use proposal_dispatcher::ProposalDispatcher;
pub use settlement::{RoundFee, SettlementPlan, ValueOutcome};
pub use tally::{compute_result, EligibleWeights};
pub use vote_engine::{VoteBook, VoterWeights};
pub use vote_rounds::VoteRoundIndex;

// Re-export commonly used types
pub use arbiter_types::governance::*;
