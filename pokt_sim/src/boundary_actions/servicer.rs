//! Servicer-side boundary actions: joining, staking, serving, jailing, leaving.

use super::{leave_sweep, link_cap, stake_toward, threshold_join};
use pokt_core::params::{BasicStrategy, JoinStrategy, RelayServingStrategy};
use pokt_core::spaces::{JailSpace, LeaveSpace, RelayRequestSpace, ServicerJoinSpace, StakeSpace};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::{AgentId, RandomnessService};

/// Decides whether a new servicer joins and which services it links.
///
/// The joiner stakes exactly the protocol minimum and holds as much again
/// in liquid POKT.
pub fn servicer_join_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Stage<ServicerJoinSpace> {
    match params.strategies.servicer_join {
        JoinStrategy::SimpleUniform => {
            if !threshold_join(state.servicers().len(), params.behavior.servicer_max_number, rng) {
                return Stage::Skipped;
            }

            let catalog: Vec<AgentId> = state.services().keys().copied().collect();
            let cap = link_cap(params).min(catalog.len());
            let services = if cap == 0 {
                Vec::new()
            } else {
                let links = rng.uniform_int(1, cap as u64) as usize;
                let mut picked: Vec<AgentId> = rng
                    .choose_many(catalog.len(), links)
                    .into_iter()
                    .map(|i| catalog[i])
                    .collect();
                picked.sort();
                picked
            };

            Stage::Fired(ServicerJoinSpace {
                name: String::new(),
                stake_amount: params.system.minimum_stake_servicer,
                personal_holdings: params.system.minimum_stake_servicer,
                geo_zone: "ABC".to_string(),
                services,
                qos: 1.0,
                service_url: None,
            })
        }
    }
}

/// Locates the session the serving leg acts on.
pub fn relay_requests_ba(state: &WorldState, params: &ParamSet) -> Stage<RelayRequestSpace> {
    match params.strategies.relay_requests {
        RelayServingStrategy::Test => state
            .latest_session()
            .map(|session| RelayRequestSpace { session: session.id })
            .into(),
    }
}

/// Proposes topping every servicer up to the minimum stake.
pub fn servicer_stake_ba(state: &WorldState, params: &ParamSet) -> Vec<StakeSpace> {
    match params.strategies.servicer_stake {
        BasicStrategy::Basic => state
            .servicers()
            .values()
            .filter_map(|servicer| stake_toward(servicer, params.system.minimum_stake_servicer))
            .collect(),
    }
}

/// Draws an independent leave decision for every servicer.
pub fn servicer_leave_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> LeaveSpace {
    match params.strategies.servicer_leave {
        BasicStrategy::Basic => leave_sweep(
            state.servicers().keys().copied(),
            params.behavior.servicer_leave_probability,
            rng,
        ),
    }
}

/// Jailed servicers whose pause has lasted at least `minimum_pause_time`.
pub fn unjailing_ba(state: &WorldState, params: &ParamSet) -> Vec<JailSpace> {
    match params.strategies.jailing {
        BasicStrategy::Basic => state
            .servicers()
            .values()
            .filter(|servicer| match servicer.pause_height {
                Some(paused_at) => {
                    state.height().saturating_sub(paused_at) >= params.system.minimum_pause_time
                }
                None => false,
            })
            .map(|servicer| JailSpace { servicer: servicer.id })
            .collect(),
    }
}

/// Each unjailed servicer is jailed with `servicer_jailing_probability`.
pub fn jailing_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Vec<JailSpace> {
    match params.strategies.jailing {
        BasicStrategy::Basic => state
            .servicers()
            .values()
            .filter(|servicer| !servicer.is_jailed())
            .filter(|_| rng.uniform() < params.behavior.servicer_jailing_probability)
            .map(|servicer| JailSpace { servicer: servicer.id })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::spaces::NewSessionSpace;
    use pokt_core::{Application, Payer, Servicer};
    use pokt_env::ScriptedRandomness;

    fn world(servicers: usize) -> WorldState {
        let mut state = WorldState::new();
        for name in ["eth", "poly", "sol"] {
            state.add_service(name);
        }
        for _ in 0..servicers {
            state
                .admit_servicer(|id| Servicer::new(id, "", 0.0, 1.0, vec![AgentId(0)], "ABC", 1.0))
                .unwrap();
        }
        state
    }

    #[test]
    fn test_join_links_distinct_services() {
        let params = ParamSet::preset("test").unwrap();
        // join draw, link count (3 of 3), then the picks
        let mut rng = ScriptedRandomness::new()
            .with_uniforms([0.9, 0.99])
            .with_choices([2, 1, 0]);

        let space = servicer_join_ba(&world(0), &params, &mut rng).fired().unwrap();
        assert_eq!(space.services, vec![AgentId(0), AgentId(1), AgentId(2)]);
        assert_eq!(space.stake_amount, params.system.minimum_stake_servicer);
        assert_eq!(space.qos, 1.0);
    }

    #[test]
    fn test_join_with_empty_catalog() {
        let params = ParamSet::preset("test").unwrap();
        let mut rng = ScriptedRandomness::new().with_uniforms([0.9]);
        let space = servicer_join_ba(&WorldState::new(), &params, &mut rng)
            .fired()
            .unwrap();
        assert!(space.services.is_empty());
    }

    #[test]
    fn test_relay_requests_targets_latest_session() {
        let params = ParamSet::preset("test").unwrap();
        let mut state = world(1);
        assert!(relay_requests_ba(&state, &params).is_skipped());

        let app = state
            .admit_application(|id| Application::new(id, "", 0.0, 0.0, vec![], "ABC", 1))
            .unwrap();
        let space = NewSessionSpace {
            application: app,
            payer: Payer::Application(app),
            servicers: vec![AgentId(0)],
            service: None,
            number_of_relays: 5,
        };
        state.create_session(&space).unwrap();
        let latest = state.create_session(&space).unwrap();

        assert_eq!(
            relay_requests_ba(&state, &params),
            Stage::Fired(RelayRequestSpace { session: latest })
        );
    }

    #[test]
    fn test_unjailing_waits_for_pause_time() {
        let params = ParamSet::preset("test").unwrap();
        let mut state = world(2);
        state.set_pause_height(AgentId(0), Some(0)).unwrap();
        state.set_pause_height(AgentId(1), Some(5)).unwrap();
        for _ in 0..params.system.minimum_pause_time {
            state.advance_height();
        }

        assert_eq!(unjailing_ba(&state, &params), vec![JailSpace { servicer: AgentId(0) }]);
    }

    #[test]
    fn test_jailing_skips_jailed() {
        let params = ParamSet::preset("test").unwrap();
        let mut state = world(3);
        state.set_pause_height(AgentId(1), Some(0)).unwrap();

        // one draw per unjailed servicer
        let mut rng = ScriptedRandomness::new().with_uniforms([0.0, 0.5]);
        assert_eq!(
            jailing_ba(&state, &params, &mut rng),
            vec![JailSpace { servicer: AgentId(0) }]
        );
        assert_eq!(rng.remaining_uniforms(), 0);
    }

    #[test]
    fn test_stake_tops_up_to_minimum() {
        let params = ParamSet::preset("test").unwrap();
        let mut state = WorldState::new();
        state
            .admit_servicer(|id| Servicer::new(id, "", 1e20, 10.0, vec![], "ABC", 1.0))
            .unwrap();

        let spaces = servicer_stake_ba(&state, &params);
        assert_eq!(spaces[0].stake_amount, params.system.minimum_stake_servicer - 10.0);
    }
}
