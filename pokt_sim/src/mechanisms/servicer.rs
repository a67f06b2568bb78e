use pokt_core::spaces::{PauseHeightSpace, ServicerJoinSpace, ServicerPaymentSpace, SlashSpace, UnlinkServiceSpace};
use pokt_core::{ParamSet, Servicer, StateInvariantError, WorldState};
use pokt_env::AgentId;

/// Admits a new servicer and links it to its services.
pub fn add_servicer(state: &mut WorldState, space: &ServicerJoinSpace) -> Result<AgentId, StateInvariantError> {
    state.admit_servicer(|id| {
        let mut servicer = Servicer::new(
            id,
            space.name.clone(),
            space.personal_holdings,
            space.stake_amount,
            space.services.clone(),
            space.geo_zone.clone(),
            space.qos,
        );
        servicer.service_url = space.service_url.clone();
        servicer
    })
}

/// Pays relay revenue into a servicer's holdings and folds it into the
/// servicer's revenue expectation for the served service.
pub fn pay_servicer(
    state: &mut WorldState,
    params: &ParamSet,
    space: &ServicerPaymentSpace,
) -> Result<(), StateInvariantError> {
    state.credit_servicer_revenue(
        space.servicer,
        space.service,
        space.amount,
        params.behavior.lambda_ewm_revenue_expectation,
    )
}

pub fn servicer_update_pause_height(state: &mut WorldState, space: &PauseHeightSpace) -> Result<(), StateInvariantError> {
    state.set_pause_height(space.servicer, space.pause_height)
}

/// Records the slash in the servicer's jailing history.
pub fn record_jail_slash(state: &mut WorldState, space: &SlashSpace) -> Result<(), StateInvariantError> {
    state.record_jail_slash(space.servicer, space.height, space.amount)
}

pub fn unlink_service_mechanism(state: &mut WorldState, space: &UnlinkServiceSpace) -> Result<(), StateInvariantError> {
    state.unlink_service(space.servicer, space.service)
}
