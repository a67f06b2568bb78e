use pokt_core::spaces::{LinkServiceSpace, ServiceJoinSpace};
use pokt_core::{StateInvariantError, WorldState};
use pokt_env::AgentId;

/// Adds a service to the catalog.
pub fn add_service(state: &mut WorldState, space: &ServiceJoinSpace) -> AgentId {
    state.add_service(space.name.clone())
}

pub fn link_service_mechanism(state: &mut WorldState, space: &LinkServiceSpace) -> Result<(), StateInvariantError> {
    state.link_service(space.servicer, space.service)
}
