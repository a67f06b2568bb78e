//! Application: a consumer of relays, optionally fronted by a gateway.

use crate::agent::{impl_staker, StakeStatus};
use pokt_env::{AgentId, AgentKey, BlockHeight, Upokt};
use serde::{Deserialize, Serialize};

/// A relay-consuming application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Unique application ID
    pub id: AgentId,

    pub name: String,

    /// Liquid balance
    pub pokt_holdings: Upokt,

    /// Escrowed balance that pays for relays
    pub staked_pokt: Upokt,

    /// Services the application requests relays for
    pub services: Vec<AgentId>,

    pub geo_zone: String,

    /// Servicers requested per session
    pub number_of_services: usize,

    /// Gateway this application delegates to
    pub delegate: Option<AgentId>,

    pub stake_status: StakeStatus,

    pub unstaking_height: Option<BlockHeight>,
}

impl_staker!(Application, AgentKey::application);

impl Application {
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        pokt_holdings: Upokt,
        staked_pokt: Upokt,
        services: Vec<AgentId>,
        geo_zone: impl Into<String>,
        number_of_services: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            pokt_holdings,
            staked_pokt,
            services,
            geo_zone: geo_zone.into(),
            number_of_services,
            delegate: None,
            stake_status: StakeStatus::Staked,
            unstaking_height: None,
        }
    }

    pub fn is_delegated(&self) -> bool {
        self.delegate.is_some()
    }
}
