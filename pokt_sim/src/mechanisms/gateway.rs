use pokt_core::spaces::{GatewayJoinSpace, ModifyBalanceSpace};
use pokt_core::{Gateway, ParamSet, StateInvariantError, WorldState};
use pokt_env::{AgentId, AgentKind};

/// Admits a new gateway with a fresh id.
pub fn add_gateway(state: &mut WorldState, space: &GatewayJoinSpace) -> Result<AgentId, StateInvariantError> {
    state.admit_gateway(|id| {
        Gateway::new(id, space.name.clone(), space.personal_holdings, space.stake_amount)
    })
}

/// Applies a stake delta to a gateway; debits count toward `fees_paid`.
pub fn modify_gateway_stake(state: &mut WorldState, space: &ModifyBalanceSpace) -> Result<(), StateInvariantError> {
    if space.public_key.kind != AgentKind::Gateway {
        return Err(StateInvariantError::UnknownAgent(space.public_key));
    }
    state.adjust_stake(space.public_key, space.amount)?;
    if space.amount < 0.0 {
        state.add_fees_paid(space.public_key.id, -space.amount)?;
    }
    Ok(())
}

/// Recomputes the understaked set: a gateway is understaked while its stake
/// is below `stake_per_app_delegation * delegators` or below the gateway
/// minimum.
pub fn update_understaked_gateways(state: &mut WorldState, params: &ParamSet) -> Result<(), StateInvariantError> {
    let flags: Vec<(AgentId, bool)> = state
        .gateways()
        .values()
        .map(|g| {
            let understaked = g.is_understaked(
                params.system.stake_per_app_delegation,
                params.system.gateway_minimum_stake,
            );
            (g.id, understaked)
        })
        .collect();
    for (id, understaked) in flags {
        state.set_understaked(id, understaked)?;
    }
    Ok(())
}
