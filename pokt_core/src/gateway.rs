//! Gateway: pays for relays on behalf of delegating applications.

use crate::agent::{impl_staker, StakeStatus};
use pokt_env::{AgentId, AgentKey, Upokt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A gateway (portal) that applications delegate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    /// Unique gateway ID
    pub id: AgentId,

    pub name: String,

    /// Liquid balance
    pub pokt_holdings: Upokt,

    /// Escrowed balance; backs delegations and pays relays
    pub staked_pokt: Upokt,

    pub service_url: Option<String>,

    /// Applications currently delegating to this gateway
    pub delegators: BTreeSet<AgentId>,

    /// Cumulative relay fees paid on behalf of delegators
    pub fees_paid: Upokt,

    pub stake_status: StakeStatus,
}

impl_staker!(Gateway, AgentKey::gateway);

impl Gateway {
    pub fn new(id: AgentId, name: impl Into<String>, pokt_holdings: Upokt, staked_pokt: Upokt) -> Self {
        Self {
            id,
            name: name.into(),
            pokt_holdings,
            staked_pokt,
            service_url: None,
            delegators: BTreeSet::new(),
            fees_paid: 0.0,
            stake_status: StakeStatus::Staked,
        }
    }

    /// Stake needed to back `delegations` delegated applications.
    pub fn required_stake(delegations: usize, stake_per_app_delegation: Upokt, minimum: Upokt) -> Upokt {
        (delegations as f64 * stake_per_app_delegation).max(minimum)
    }

    /// True if the current stake cannot back the current delegations.
    pub fn is_understaked(&self, stake_per_app_delegation: Upokt, minimum: Upokt) -> bool {
        self.staked_pokt < Self::required_stake(self.delegators.len(), stake_per_app_delegation, minimum)
    }
}
