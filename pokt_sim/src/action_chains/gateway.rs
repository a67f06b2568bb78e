//! Gateway chains: join, stake (with the understaked refresh), leave.

use super::{ChainOutcome, FanOutReport};
use crate::boundary_actions::{gateway_join_ba, gateway_leave_ba, gateway_stake_ba};
use crate::error::SimError;
use crate::mechanisms::{add_gateway, remove_agent, stake_transfer, update_understaked_gateways};
use crate::policy::{gateway_join_policy, gateway_leave_policy, gateway_stake_policy};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{AgentId, RandomnessService};
use tracing::debug;

pub fn gateway_join_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<ChainOutcome<AgentId>, SimError> {
    let Stage::Fired(space) = gateway_join_ba(state, params, rng) else {
        return Ok(ChainOutcome::Skipped);
    };
    let Stage::Fired(space) = gateway_join_policy(params, space) else {
        return Ok(ChainOutcome::Skipped);
    };
    let id = add_gateway(state, &space)?;
    debug!("Gateway {} joined with stake {}", id, space.stake_amount);
    Ok(ChainOutcome::Applied(id))
}

/// Tops gateways up toward their target, then refreshes the understaked set.
///
/// # Errors
/// Only the refresh can fail the chain; per-gateway failures are reported.
pub fn gateway_stake_ac(state: &mut WorldState, params: &ParamSet) -> Result<FanOutReport, SimError> {
    let mut report = FanOutReport::default();
    for space in gateway_stake_ba(state, params) {
        let result = match gateway_stake_policy(state, &space) {
            Stage::Fired(spaces) => stake_transfer(state, &spaces)
                .map(|_| ChainOutcome::Applied(()))
                .map_err(SimError::from),
            Stage::Skipped => Ok(ChainOutcome::Skipped),
        };
        report.record("gateway_stake", space.public_key, result);
    }
    update_understaked_gateways(state, params)?;
    Ok(report)
}

pub fn gateway_leave_ac(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> FanOutReport {
    let leave = gateway_leave_ba(state, params, rng);
    let mut report = FanOutReport::default();
    for space in gateway_leave_policy(state, &leave) {
        let result = remove_agent(state, &space)
            .map(|_| ChainOutcome::Applied(()))
            .map_err(SimError::from);
        report.record("gateway_leave", space.public_key, result);
    }
    if report.applied > 0 {
        debug!("{} gateways left", report.applied);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::params::ParamTable;
    use pokt_core::spaces::NewSessionSpace;
    use pokt_core::{Application, Gateway, Payer, Servicer};
    use pokt_env::ScriptedRandomness;

    #[test]
    fn test_stake_refreshes_understaked() {
        let params = ParamSet::preset("test").unwrap();
        let mut state = WorldState::new();
        // no holdings to top up from: stays below minimum
        let broke = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 1.0)).unwrap();
        let funded = state.admit_gateway(|id| Gateway::new(id, "", 1e13, 1.0)).unwrap();

        let report = gateway_stake_ac(&mut state, &params).unwrap();
        assert_eq!((report.applied, report.skipped), (1, 1));
        assert_eq!(state.gateway(funded).unwrap().staked_pokt, params.system.gateway_minimum_stake);
        assert!(state.understaked_gateways().contains(&broke));
        assert!(!state.understaked_gateways().contains(&funded));
    }

    #[test]
    fn test_gateway_leave_falls_back_to_application_payer() {
        let mut table = ParamTable::test();
        table.behavior.gateway_leave_probability = 1.0;
        let params = ParamSet::from_table(table).unwrap();

        let mut state = WorldState::new();
        let s = state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![], "ABC", 1.0))
            .unwrap();
        let a = state
            .admit_application(|id| Application::new(id, "", 0.0, 0.0, vec![], "ABC", 1))
            .unwrap();
        let g = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 0.0)).unwrap();
        state.link_delegation(a, g).unwrap();
        let session = state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Gateway(g),
                servicers: vec![s],
                service: None,
                number_of_relays: 3,
            })
            .unwrap();

        let report = gateway_leave_ac(&mut state, &params, &mut ScriptedRandomness::new());
        assert_eq!(report.applied, 1);
        assert!(state.gateways().is_empty());
        assert_eq!(state.application(a).unwrap().delegate, None);
        assert_eq!(state.session(session).unwrap().payer, Payer::Application(a));
    }

    #[test]
    fn test_join_admits_gateway() {
        let params = ParamSet::preset("test").unwrap();
        let mut state = WorldState::new();
        let mut rng = ScriptedRandomness::new().with_uniforms([0.1]);
        let outcome = gateway_join_ac(&mut state, &params, &mut rng).unwrap();
        assert_eq!(outcome, ChainOutcome::Applied(AgentId(0)));
    }
}
