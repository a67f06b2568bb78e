//! Application chains: join, delegation, undelegation, stake, leave.

use super::{ChainOutcome, FanOutReport};
use crate::boundary_actions::{
    application_join_ba, application_leave_ba, application_stake_ba, gateway_delegation_ba,
    gateway_undelegation_ba,
};
use crate::error::SimError;
use crate::mechanisms::{add_application, link_delegation, remove_agent, stake_transfer, unlink_delegation};
use crate::policy::{
    application_join_policy, application_leave_policy, application_stake_policy,
    gateway_delegation_policy, gateway_undelegation_policy,
};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{AgentId, AgentKey, RandomnessService};
use tracing::debug;

pub fn application_join_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<ChainOutcome<AgentId>, SimError> {
    let Stage::Fired(space) = application_join_ba(state, params, rng) else {
        return Ok(ChainOutcome::Skipped);
    };
    let Stage::Fired(space) = application_join_policy(state, params, space) else {
        return Ok(ChainOutcome::Skipped);
    };
    let id = add_application(state, &space)?;
    debug!("Application {} joined with stake {}", id, space.stake_amount);
    Ok(ChainOutcome::Applied(id))
}

/// Delegation sweep. Elements run in order, so each policy check sees the
/// delegations committed before it.
pub fn gateway_delegation_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    for space in gateway_delegation_ba(state, params, rng) {
        let result = match gateway_delegation_policy(state, params, &space) {
            Stage::Fired(space) => link_delegation(state, &space)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("gateway_delegation", AgentKey::application(space.application), result);
    }
    report
}

pub fn gateway_undelegation_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    for space in gateway_undelegation_ba(state, params, rng) {
        let result = match gateway_undelegation_policy(state, &space) {
            Stage::Fired(space) => unlink_delegation(state, &space)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("gateway_undelegation", AgentKey::application(space.application), result);
    }
    report
}

pub fn application_stake_ac(state: &mut WorldState, params: &ParamSet) -> FanOutReport {
    let mut report = FanOutReport::default();
    for space in application_stake_ba(state, params) {
        let result = match application_stake_policy(state, &space) {
            Stage::Fired(spaces) => stake_transfer(state, &spaces)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("application_stake", space.public_key, result);
    }
    report
}

pub fn application_leave_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let leave = application_leave_ba(state, params, rng);
    let mut report = FanOutReport::default();
    for space in application_leave_policy(state, &leave) {
        let result = remove_agent(state, &space)
            .map(|_| ChainOutcome::Applied(()))
            .map_err(SimError::from);
        report.record("application_leave", space.public_key, result);
    }
    if report.applied > 0 {
        debug!("{} applications left", report.applied);
    }
    report
}
