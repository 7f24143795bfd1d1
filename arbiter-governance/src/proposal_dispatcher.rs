//! Encoding and dispatch of governance actions.
//!
//! A proposal stores its action as `(target, selector, payload)`. On
//! execution the call is decoded back into a [`GovernanceAction`] and
//! applied either to the oracle or to the local user list.

use std::collections::HashSet;

use log::info;

use arbiter_types::{ActionCall, Address, GovernanceAction, OracleEnvironment};

use crate::error::GovernanceResult;

#[derive(Debug, Clone, Default)]
pub struct ProposalDispatcher {
    users: HashSet<Address>,
}

impl ProposalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the stored call for `action`. Oracle parameter changes target
    /// the oracle; user-list updates target this governance instance.
    pub fn encode(
        action: &GovernanceAction,
        governance_address: Address,
        oracle_address: Address,
    ) -> GovernanceResult<ActionCall> {
        let target = if action.targets_governance() {
            governance_address
        } else {
            oracle_address
        };
        Ok(ActionCall {
            target,
            selector: action.selector(),
            payload: action.encode_payload()?,
        })
    }

    pub fn is_user(&self, address: &Address) -> bool {
        self.users.contains(address)
    }

    pub fn set_user(&mut self, user: Address, is_user: bool) {
        if is_user {
            self.users.insert(user);
        } else {
            self.users.remove(&user);
        }
        info!("User {} list membership set to {}", hex::encode(user), is_user);
    }

    /// Decodes and applies a passed proposal's call.
    pub fn dispatch<E: OracleEnvironment>(
        &mut self,
        call: &ActionCall,
        env: &mut E,
        governance_address: Address,
    ) -> GovernanceResult<GovernanceAction> {
        let action = GovernanceAction::decode(&call.selector, &call.payload)?;
        match &action {
            GovernanceAction::ChangeStakeAmount(amount) => {
                env.set_stake_amount(governance_address, *amount)?;
                info!("Stake amount changed to {}", amount);
            }
            GovernanceAction::ChangeReportingLock(lock) => {
                env.set_reporting_lock(governance_address, *lock)?;
                info!("Reporting lock changed to {}s", lock);
            }
            GovernanceAction::ChangeGovernanceAddress(new_governance) => {
                env.set_governance_address(governance_address, *new_governance)?;
                info!("Oracle governance handed to {}", hex::encode(new_governance));
            }
            GovernanceAction::UpdateUserList { user, is_user } => {
                self.set_user(*user, *is_user);
            }
        }
        Ok(action)
    }
}
