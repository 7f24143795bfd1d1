//! Engine configuration: addresses, time windows and fee parameters.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use arbiter_types::{Address, Amount, Timestamp, DAY, PRECISION, ZERO_ADDRESS};

use crate::error::{GovernanceError, GovernanceResult};

/// What happens to proposal fees when the proposal does not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalFeePolicy {
    /// Paid to the team multisig.
    ForfeitToMultisig,
    /// Returned to each round's initiator.
    Refund,
    /// Left in the governance escrow.
    Retain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Address of this governance instance; holds fee and stake escrow.
    #[serde(with = "hex::serde")]
    pub governance_address: Address,
    /// Oracle whose parameters proposals change.
    #[serde(with = "hex::serde")]
    pub oracle_address: Address,
    #[serde(with = "hex::serde")]
    pub team_multisig: Address,
    /// Floor for the round-1 dispute fee, which is otherwise stake / 10.
    #[serde(with = "amount_string")]
    pub min_dispute_fee: Amount,
    /// Round-1 fee for governance proposals.
    #[serde(with = "amount_string")]
    pub proposal_fee: Amount,
    pub dispute_vote_duration: Timestamp,
    pub proposal_vote_duration: Timestamp,
    /// Time after a tally during which the next round may be opened.
    pub escalation_window: Timestamp,
    /// Wait after a tally before execution, multiplied by the round number.
    pub settlement_delay: Timestamp,
    pub proposal_fee_policy: ProposalFeePolicy,
    /// Only listed users and the team multisig may propose a new governance address.
    pub restrict_governance_proposals: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            governance_address: ZERO_ADDRESS,
            oracle_address: ZERO_ADDRESS,
            team_multisig: ZERO_ADDRESS,
            min_dispute_fee: 10 * PRECISION,
            proposal_fee: 10 * PRECISION,
            dispute_vote_duration: 2 * DAY,
            proposal_vote_duration: 7 * DAY,
            escalation_window: DAY,
            settlement_delay: DAY,
            proposal_fee_policy: ProposalFeePolicy::ForfeitToMultisig,
            restrict_governance_proposals: false,
        }
    }
}

impl GovernanceConfig {
    pub fn new(governance_address: Address, oracle_address: Address, team_multisig: Address) -> Self {
        Self {
            governance_address,
            oracle_address,
            team_multisig,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> GovernanceResult<()> {
        if self.governance_address == ZERO_ADDRESS {
            return Err(GovernanceError::InvalidConfig("governance address must be set".to_string()));
        }
        if self.oracle_address == ZERO_ADDRESS {
            return Err(GovernanceError::InvalidConfig("oracle address must be set".to_string()));
        }
        if self.team_multisig == ZERO_ADDRESS {
            return Err(GovernanceError::InvalidConfig("team multisig must be set".to_string()));
        }
        if self.dispute_vote_duration == 0 || self.proposal_vote_duration == 0 {
            return Err(GovernanceError::InvalidConfig("vote durations must be positive".to_string()));
        }
        if self.escalation_window == 0 {
            return Err(GovernanceError::InvalidConfig("escalation window must be positive".to_string()));
        }
        if self.proposal_fee == 0 {
            return Err(GovernanceError::InvalidConfig("proposal fee must be positive".to_string()));
        }
        Ok(())
    }

    /// Loads a TOML configuration, writing defaults if the file is missing.
    pub fn load(path: impl AsRef<Path>) -> GovernanceResult<Self> {
        let path = path.as_ref();
        let config: GovernanceConfig = confy::load_path(path)?;
        config.validate()?;
        info!("Loaded governance configuration from {}", path.display());
        Ok(config)
    }

    pub fn store(&self, path: impl AsRef<Path>) -> GovernanceResult<()> {
        confy::store_path(path, self.clone())?;
        Ok(())
    }

    pub fn vote_duration(&self, is_dispute: bool) -> Timestamp {
        if is_dispute {
            self.dispute_vote_duration
        } else {
            self.proposal_vote_duration
        }
    }
}

/// Token amounts exceed what TOML integers hold; store them as decimal strings.
mod amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    use arbiter_types::Amount;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Amount>().map_err(serde::de::Error::custom)
    }
}
