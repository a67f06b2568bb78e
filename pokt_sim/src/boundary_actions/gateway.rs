//! Gateway-side boundary actions.

use super::{stake_toward, threshold_join};
use pokt_core::params::{BasicStrategy, JoinStrategy};
use pokt_core::spaces::{GatewayJoinSpace, LeaveSpace, StakeSpace};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{RandomnessService, Upokt};

const JOIN_STAKE: Upokt = 150000.0 * 10e6;
const JOIN_HOLDINGS: Upokt = 1500000.0 * 10e6;

/// Decides whether a new gateway joins this block.
pub fn gateway_join_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Stage<GatewayJoinSpace> {
    match params.strategies.gateway_join {
        JoinStrategy::SimpleUniform => {
            if !threshold_join(state.gateways().len(), params.behavior.gateway_max_number, rng) {
                return Stage::Skipped;
            }
            Stage::Fired(GatewayJoinSpace {
                name: String::new(),
                stake_amount: JOIN_STAKE,
                personal_holdings: JOIN_HOLDINGS,
            })
        }
    }
}

/// Stake a gateway keeps so that it could back every application expected
/// to use a gateway: `max(gateway_minimum_stake,
/// stake_per_app_delegation * |applications| * uses_gateway_probability)`.
pub fn gateway_stake_target(state: &WorldState, params: &ParamSet) -> Upokt {
    let expected = params.system.stake_per_app_delegation
        * state.applications().len() as f64
        * params.behavior.uses_gateway_probability;
    expected.max(params.system.gateway_minimum_stake)
}

/// Proposes a stake top-up for every gateway below target.
pub fn gateway_stake_ba(state: &WorldState, params: &ParamSet) -> Vec<StakeSpace> {
    match params.strategies.gateway_stake {
        BasicStrategy::Basic => {
            let target = gateway_stake_target(state, params);
            state
                .gateways()
                .values()
                .filter_map(|gateway| stake_toward(gateway, target))
                .collect()
        }
    }
}

/// Leave decision per gateway. An understaked gateway below the minimum
/// stake always leaves and consumes no draw.
pub fn gateway_leave_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> LeaveSpace {
    match params.strategies.gateway_leave {
        BasicStrategy::Basic => {
            let decisions = state
                .gateways()
                .values()
                .map(|gateway| {
                    let forced = state.understaked_gateways().contains(&gateway.id)
                        && gateway.staked_pokt < params.system.gateway_minimum_stake;
                    let leaves =
                        forced || rng.uniform() < params.behavior.gateway_leave_probability;
                    (gateway.id, leaves)
                })
                .collect();
            LeaveSpace { decisions }
        }
    }
}
