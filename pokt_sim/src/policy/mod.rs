//! Policies: protocol-level validation and exact delta computation.
//!
//! A policy reads the world and the proposal of a boundary action and either
//! vetoes it (`Stage::Skipped`) or returns the precise deltas the mechanisms
//! will commit. Policies never mutate and never draw randomness.

mod application;
mod gateway;
mod service;
mod servicer;

pub use application::{
    application_join_policy, application_leave_policy, application_stake_policy,
    gateway_delegation_policy, gateway_undelegation_policy, submit_relay_requests_policy,
};
pub use gateway::{gateway_join_policy, gateway_leave_policy, gateway_stake_policy};
pub use service::{
    service_join_policy, service_leave_policy, service_linking_policy, service_unlinking_policy,
};
pub use servicer::{
    jail_node_policy, servicer_join_policy, servicer_leave_policy, servicer_relay_policy,
    servicer_stake_policy, unjail_policy,
};

use pokt_core::spaces::{
    LeaveSpace, ModifyBalanceSpace, RemoveAgentSpace, StakeSpace, StakeTransferSpaces,
};
use pokt_core::{Stage, WorldState};
use pokt_env::{AgentId, AgentKey};

/// Turns a stake proposal into a holdings debit and a stake credit of the
/// same size, re-clamped against the agent's current holdings.
///
/// Skipped when the agent is gone or there is nothing to move.
pub(crate) fn stake_transfer_policy(state: &WorldState, space: &StakeSpace) -> Stage<StakeTransferSpaces> {
    let Some(agent) = state.agent(space.public_key) else {
        return Stage::Skipped;
    };
    let amount = space.stake_amount.min(agent.pokt_holdings()).max(0.0);
    if amount <= 0.0 {
        return Stage::Skipped;
    }
    Stage::Fired(StakeTransferSpaces {
        holdings: ModifyBalanceSpace {
            public_key: space.public_key,
            amount: -amount,
        },
        stake: ModifyBalanceSpace {
            public_key: space.public_key,
            amount,
        },
    })
}

/// Removal orders for the agents flagged to leave that still exist.
pub(crate) fn removal_policy(
    state: &WorldState,
    leave: &LeaveSpace,
    key: fn(AgentId) -> AgentKey,
) -> Vec<RemoveAgentSpace> {
    leave
        .leaving()
        .map(key)
        .filter(|public_key| state.agent(*public_key).is_some())
        .map(|public_key| RemoveAgentSpace { public_key })
        .collect()
}
