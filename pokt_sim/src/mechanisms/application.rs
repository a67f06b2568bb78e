use pokt_core::spaces::{ApplicationJoinSpace, DelegationSpace};
use pokt_core::{Application, StateInvariantError, WorldState};
use pokt_env::AgentId;

/// Admits a new application with a fresh id.
pub fn add_application(state: &mut WorldState, space: &ApplicationJoinSpace) -> Result<AgentId, StateInvariantError> {
    state.admit_application(|id| {
        Application::new(
            id,
            space.name.clone(),
            space.personal_holdings,
            space.stake_amount,
            space.services.clone(),
            space.geo_zone.clone(),
            space.number_servicers,
        )
    })
}

/// Links application and gateway on both sides.
pub fn link_delegation(state: &mut WorldState, space: &DelegationSpace) -> Result<(), StateInvariantError> {
    state.link_delegation(space.application, space.gateway)
}

/// Unlinks application and gateway on both sides.
pub fn unlink_delegation(state: &mut WorldState, space: &DelegationSpace) -> Result<(), StateInvariantError> {
    state.unlink_delegation(space.application).map(|_| ())
}
