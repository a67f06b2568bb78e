//! Service chains: catalog join and leave, servicer linking and unlinking.

use super::{ChainOutcome, FanOutReport};
use crate::boundary_actions::{
    service_join_ba, service_leave_ba, service_linking_ba, service_unlinking_ba,
};
use crate::error::SimError;
use crate::mechanisms::{add_service, link_service_mechanism, remove_agent, unlink_service_mechanism};
use crate::policy::{
    service_join_policy, service_leave_policy, service_linking_policy, service_unlinking_policy,
};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{AgentId, AgentKey, RandomnessService};
use tracing::debug;

pub fn service_join_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<ChainOutcome<AgentId>, SimError> {
    let Stage::Fired(space) = service_join_ba(state, params, rng) else {
        return Ok(ChainOutcome::Skipped);
    };
    let Stage::Fired(space) = service_join_policy(state, params, space) else {
        return Ok(ChainOutcome::Skipped);
    };
    let id = add_service(state, &space);
    debug!("Service {} ({}) joined", id, space.name);
    Ok(ChainOutcome::Applied(id))
}

/// Unlinks every servicer from each departing service, then removes it.
///
/// The report counts removals; unlink failures are folded into it.
pub fn service_leave_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let leave = service_leave_ba(state, params, rng);
    let spaces = service_leave_policy(state, &leave);

    let mut report = FanOutReport::default();
    for space in &spaces.unlinks {
        if let Err(e) = unlink_service_mechanism(state, space) {
            report.record::<()>("service_unlink", AgentKey::service(space.service), Err(e.into()));
        }
    }
    for space in &spaces.removals {
        let result = remove_agent(state, space)
            .map(|_| ChainOutcome::Applied(()))
            .map_err(SimError::from);
        report.record("service_leave", space.public_key, result);
    }
    if report.applied > 0 {
        debug!("{} services left", report.applied);
    }
    report
}

pub fn service_linking_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    for space in service_linking_ba(state, params, rng) {
        let result = match service_linking_policy(state, params, &space) {
            Stage::Fired(link) => link_service_mechanism(state, &link)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("service_linking", AgentKey::servicer(space.servicer), result);
    }
    report
}

pub fn service_unlinking_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    for space in service_unlinking_ba(state, params, rng) {
        let result = match service_unlinking_policy(state, &space) {
            Stage::Fired(unlink) => unlink_service_mechanism(state, &unlink)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("service_unlinking", AgentKey::servicer(space.servicer), result);
    }
    report
}
