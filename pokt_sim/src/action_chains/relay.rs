//! The relay chain: request a session, then serve relays against it.
//!
//! Leg 1 samples a request, admits a session through the V1 policy and
//! opens it, closing the application's earlier sessions. Leg 2 locates the session, prices the relays its servicers
//! can serve, charges the payer (gateway or application) and pays the
//! servicers and the protocol. A session that is exhausted or made no
//! progress is torn down.

use crate::boundary_actions::{relay_requests_ba, submit_relay_requests_ba};
use crate::error::SimError;
use crate::mechanisms::{
    burn_pokt_mechanism, collect_relay_fees, create_new_session, modify_gateway_stake,
    modify_stake, pay_servicer, remove_session, serve_session,
};
use crate::policy::{servicer_relay_policy, submit_relay_requests_policy};
use pokt_core::spaces::RelayServingSpaces;
use pokt_core::{ParamSet, Payer, Stage, WorldState};
use pokt_env::RandomnessService;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relays requested and served by one relay chain invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySummary {
    pub total_relays: u64,
    pub processed_relays: u64,
}

impl RelaySummary {
    fn unserved(total_relays: u64) -> Self {
        Self {
            total_relays,
            processed_relays: 0,
        }
    }
}

/// Runs both legs of the relay chain.
///
/// Returns `{0, 0}` when no request was sampled (or zero relays were
/// drawn) and `{N, 0}` when the request could not be admitted.
///
/// # Errors
/// A mechanism failure aborts the chain; mechanisms already committed in
/// this invocation stay committed.
pub fn relay_requests_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<RelaySummary, SimError> {
    // Leg 1: request and admission
    let Stage::Fired(request) = submit_relay_requests_ba(state, params, rng)? else {
        return Ok(RelaySummary::default());
    };
    let total = request.number_of_requests;
    if total == 0 {
        return Ok(RelaySummary::default());
    }
    let Stage::Fired(admission) = submit_relay_requests_policy(state, params, &request) else {
        debug!("Relay request of {} for {} not admitted", total, request.application);
        return Ok(RelaySummary::unserved(total));
    };
    for superseded in &admission.superseded {
        remove_session(state, *superseded)?;
    }
    let session = create_new_session(state, &admission.session)?;
    if let Some(burn) = &admission.burn {
        burn_pokt_mechanism(state, burn)?;
    }

    // Leg 2: serving
    let Stage::Fired(target) = relay_requests_ba(state, params) else {
        return Ok(RelaySummary::unserved(total));
    };
    let Stage::Fired(serving) = servicer_relay_policy(state, params, &target) else {
        return Ok(RelaySummary::unserved(total));
    };
    commit_serving(state, params, &serving)?;

    debug!(
        "{}: served {}/{} relays{}",
        session,
        serving.serve.processed_relays,
        total,
        if serving.teardown.is_some() { ", torn down" } else { "" }
    );
    Ok(RelaySummary {
        total_relays: total,
        processed_relays: serving.serve.processed_relays,
    })
}

fn commit_serving(state: &mut WorldState, params: &ParamSet, spaces: &RelayServingSpaces) -> Result<(), SimError> {
    match spaces.payer {
        Payer::Gateway(_) => modify_gateway_stake(state, &spaces.payment)?,
        Payer::Application(_) => modify_stake(state, &spaces.payment)?,
    }
    if let Some(burn) = &spaces.burn {
        burn_pokt_mechanism(state, burn)?;
    }
    for payout in &spaces.payouts {
        pay_servicer(state, params, payout)?;
    }
    collect_relay_fees(state, &spaces.fees)?;
    serve_session(state, &spaces.serve)?;
    if let Some(session) = spaces.teardown {
        remove_session(state, session)?;
    }
    Ok(())
}
