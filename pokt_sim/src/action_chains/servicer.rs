//! Servicer chains: join, stake, leave, jailing/slashing.

use super::{ChainOutcome, FanOutReport};
use crate::boundary_actions::{
    jailing_ba, servicer_join_ba, servicer_leave_ba, servicer_stake_ba, unjailing_ba,
};
use crate::error::SimError;
use crate::mechanisms::{
    add_servicer, burn_pokt_mechanism, record_jail_slash, remove_agent,
    servicer_update_pause_height, stake_transfer, unlink_service_mechanism,
};
use crate::policy::{
    jail_node_policy, servicer_join_policy, servicer_leave_policy, servicer_stake_policy,
    unjail_policy,
};
use pokt_core::spaces::{BurnSpace, JailSpaces};
use pokt_core::{ParamSet, Stage, StateInvariantError, WorldState};
use pokt_env::{AgentId, AgentKey, RandomnessService};
use tracing::debug;

pub fn servicer_join_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<ChainOutcome<AgentId>, SimError> {
    let Stage::Fired(space) = servicer_join_ba(state, params, rng) else {
        return Ok(ChainOutcome::Skipped);
    };
    let Stage::Fired(space) = servicer_join_policy(state, params, space) else {
        return Ok(ChainOutcome::Skipped);
    };
    let id = add_servicer(state, &space)?;
    debug!("Servicer {} joined offering {} services", id, space.services.len());
    Ok(ChainOutcome::Applied(id))
}

pub fn servicer_stake_ac(state: &mut WorldState, params: &ParamSet) -> FanOutReport {
    let mut report = FanOutReport::default();
    for space in servicer_stake_ba(state, params) {
        let result = match servicer_stake_policy(state, &space) {
            Stage::Fired(spaces) => stake_transfer(state, &spaces)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("servicer_stake", space.public_key, result);
    }
    report
}

/// Unlinks every service of each departing servicer, then removes them.
///
/// The report counts removals; unlink failures are folded into it.
pub fn servicer_leave_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let leave = servicer_leave_ba(state, params, rng);
    let spaces = servicer_leave_policy(state, &leave);

    let mut report = FanOutReport::default();
    for space in &spaces.unlinks {
        if let Err(e) = unlink_service_mechanism(state, space) {
            report.record::<()>("servicer_unlink", AgentKey::servicer(space.servicer), Err(e.into()));
        }
    }
    for space in &spaces.removals {
        let result = remove_agent(state, space)
            .map(|_| ChainOutcome::Applied(()))
            .map_err(SimError::from);
        report.record("servicer_leave", space.public_key, result);
    }
    if report.applied > 0 {
        debug!("{} servicers left", report.applied);
    }
    report
}

/// Outcome of one jailing/slashing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JailingReport {
    pub unjailed: FanOutReport,
    pub jailed: FanOutReport,
}

fn jail(state: &mut WorldState, spaces: &JailSpaces) -> Result<(), StateInvariantError> {
    burn_pokt_mechanism(
        state,
        &BurnSpace {
            public_key: AgentKey::servicer(spaces.slash.servicer),
            amount: spaces.slash.amount,
        },
    )?;
    record_jail_slash(state, &spaces.slash)?;
    servicer_update_pause_height(state, &spaces.pause)
}

/// Releases servicers that served their pause, then jails new ones.
///
/// Unjailing runs first so a servicer released this block can be jailed
/// again by the same pass.
pub fn jailing_slashing_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> JailingReport {
    let mut report = JailingReport::default();

    for space in unjailing_ba(state, params) {
        let result = match unjail_policy(state, params, &space) {
            Stage::Fired(pause) => servicer_update_pause_height(state, &pause)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.unjailed.record("unjail", AgentKey::servicer(space.servicer), result);
    }

    for space in jailing_ba(state, params, rng) {
        let result = match jail_node_policy(state, params, &space) {
            Stage::Fired(spaces) => jail(state, &spaces)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.jailed.record("jail", AgentKey::servicer(space.servicer), result);
    }

    if report.jailed.applied > 0 || report.unjailed.applied > 0 {
        debug!(
            "Jailed {} servicers, released {}",
            report.jailed.applied, report.unjailed.applied
        );
    }
    report
}
