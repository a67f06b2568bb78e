//! Application-side boundary actions.

use super::{leave_sweep, stake_toward, threshold_join};
use crate::error::SimError;
use pokt_core::params::{BasicStrategy, DelegationStrategy, JoinStrategy, SubmitRelayStrategy};
use pokt_core::spaces::{
    ApplicationJoinSpace, DelegationSpace, LeaveSpace, StakeSpace, SubmitRelayRequestSpace,
};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{AgentId, RandomnessService, Upokt};

/// Escrow a newly joined application deposits.
const JOIN_STAKE: Upokt = 15000.0;

/// Liquid POKT a newly joined application brings along.
const JOIN_HOLDINGS: Upokt = 100.0;

/// Safety margin over the expected relay spend when sizing application stake.
const STAKE_BUFFER: f64 = 1.2;

/// Relays requested per session by the `test` variant.
const TEST_RELAYS_PER_SESSION: u64 = 10;

// =============================================================================
// JOIN
// =============================================================================

/// Decides whether a new application joins this block.
pub fn application_join_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Stage<ApplicationJoinSpace> {
    match params.strategies.application_join {
        JoinStrategy::SimpleUniform => {
            if !threshold_join(state.applications().len(), params.behavior.application_max_number, rng) {
                return Stage::Skipped;
            }
            let catalog: Vec<AgentId> = state.services().keys().copied().collect();
            let services = rng
                .choose_index(catalog.len())
                .map(|i| vec![catalog[i]])
                .unwrap_or_default();

            Stage::Fired(ApplicationJoinSpace {
                name: String::new(),
                stake_amount: JOIN_STAKE,
                geo_zone: "ABC".to_string(),
                number_servicers: 1,
                personal_holdings: JOIN_HOLDINGS,
                services,
            })
        }
    }
}

// =============================================================================
// DELEGATION
// =============================================================================

/// Sweeps undelegated applications and proposes a gateway for each one that
/// decides to delegate. Proposes nothing while there are no gateways.
pub fn gateway_delegation_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Vec<DelegationSpace> {
    let gateways: Vec<AgentId> = state.gateways().keys().copied().collect();
    if gateways.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for application in state.applications().values() {
        if application.is_delegated() {
            continue;
        }
        let wants_gateway = match params.strategies.gateway_delegation {
            DelegationStrategy::Test => application.id.is_odd(),
            DelegationStrategy::Basic => rng.uniform() < params.behavior.uses_gateway_probability,
        };
        if !wants_gateway {
            continue;
        }
        if let Some(i) = rng.choose_index(gateways.len()) {
            out.push(DelegationSpace {
                application: application.id,
                gateway: gateways[i],
            });
        }
    }
    out
}

/// Sweeps delegated applications; each drops its gateway with
/// `gateway_undelegation_probability`.
pub fn gateway_undelegation_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Vec<DelegationSpace> {
    match params.strategies.gateway_undelegation {
        BasicStrategy::Basic => state
            .applications()
            .values()
            .filter_map(|application| {
                let gateway = application.delegate?;
                (rng.uniform() < params.behavior.gateway_undelegation_probability).then_some(
                    DelegationSpace {
                        application: application.id,
                        gateway,
                    },
                )
            })
            .collect(),
    }
}

// =============================================================================
// RELAY REQUESTS
// =============================================================================

/// Picks a random application and samples how many relays it requests.
///
/// # Errors
/// `SimError::Randomness` if the Gamma parameters are rejected.
pub fn submit_relay_requests_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<Stage<SubmitRelayRequestSpace>, SimError> {
    let applications: Vec<AgentId> = state.applications().keys().copied().collect();
    let Some(pick) = rng.choose_index(applications.len()) else {
        return Ok(Stage::Skipped);
    };

    let number_of_requests = match params.strategies.submit_relay_requests {
        SubmitRelayStrategy::Test => TEST_RELAYS_PER_SESSION,
        SubmitRelayStrategy::BasicGamma => {
            let draw = rng.gamma(
                params.behavior.relays_per_session_gamma_distribution_shape,
                params.behavior.relays_per_session_gamma_distribution_scale,
            )?;
            draw.floor().max(0.0) as u64
        }
    };
    let number_of_servicers = rng.uniform_int(
        params.behavior.applications_use_min_servicers as u64,
        params.behavior.applications_use_max_servicers as u64,
    ) as usize;

    Ok(Stage::Fired(SubmitRelayRequestSpace {
        application: applications[pick],
        number_of_requests,
        number_of_servicers,
    }))
}

// =============================================================================
// STAKE / LEAVE
// =============================================================================

/// Stake an application needs to cover its expected relay spend:
/// `1.2 * shape * scale * average_session_per_application * relays_to_tokens_multiplier`.
pub fn application_stake_target(params: &ParamSet) -> Upokt {
    STAKE_BUFFER
        * params.average_relays_per_session()
        * params.behavior.average_session_per_application
        * params.system.relays_to_tokens_multiplier
}

/// Proposes a stake top-up for every application below its target.
pub fn application_stake_ba(state: &WorldState, params: &ParamSet) -> Vec<StakeSpace> {
    match params.strategies.application_stake {
        BasicStrategy::Basic => {
            let target = application_stake_target(params);
            state
                .applications()
                .values()
                .filter_map(|application| stake_toward(application, target))
                .collect()
        }
    }
}

/// Draws an independent leave decision for every application.
pub fn application_leave_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> LeaveSpace {
    match params.strategies.application_leave {
        BasicStrategy::Basic => leave_sweep(
            state.applications().keys().copied(),
            params.behavior.application_leave_probability,
            rng,
        ),
    }
}
