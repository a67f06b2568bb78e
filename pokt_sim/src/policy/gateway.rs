//! Gateway-side policies.

use super::{removal_policy, stake_transfer_policy};
use pokt_core::spaces::{GatewayJoinSpace, LeaveSpace, RemoveAgentSpace, StakeSpace, StakeTransferSpaces};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{AgentKey, AgentKind};

/// A gateway may only join with at least the minimum gateway stake.
pub fn gateway_join_policy(params: &ParamSet, space: GatewayJoinSpace) -> Stage<GatewayJoinSpace> {
    if !space.personal_holdings.is_finite() || space.personal_holdings < 0.0 {
        return Stage::Skipped;
    }
    if !(space.stake_amount >= params.system.gateway_minimum_stake) {
        return Stage::Skipped;
    }
    Stage::Fired(space)
}

pub fn gateway_stake_policy(state: &WorldState, space: &StakeSpace) -> Stage<StakeTransferSpaces> {
    if space.public_key.kind != AgentKind::Gateway {
        return Stage::Skipped;
    }
    stake_transfer_policy(state, space)
}

pub fn gateway_leave_policy(state: &WorldState, leave: &LeaveSpace) -> Vec<RemoveAgentSpace> {
    removal_policy(state, leave, AgentKey::gateway)
}
