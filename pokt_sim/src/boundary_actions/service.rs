//! Service lifecycle: catalog joins and departures, and servicers linking
//! or dropping the services they offer.

use super::{leave_sweep, link_cap, threshold_join};
use crate::genesis::service_name;
use pokt_core::params::{BasicStrategy, JoinStrategy};
use pokt_core::spaces::{LeaveSpace, LinkServiceSpace, ServiceJoinSpace, UnlinkServiceSpace};
use pokt_core::{ParamSet, Servicer, Stage, WorldState};
use pokt_env::{AgentId, RandomnessService};

/// Decides whether a new service enters the catalog.
pub fn service_join_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Stage<ServiceJoinSpace> {
    match params.strategies.service_join {
        JoinStrategy::SimpleUniform => {
            if !threshold_join(state.services().len(), params.behavior.service_max_number, rng) {
                return Stage::Skipped;
            }
            Stage::Fired(ServiceJoinSpace {
                name: service_name(state.services().len()),
            })
        }
    }
}

/// Draws an independent leave decision for every service.
pub fn service_leave_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> LeaveSpace {
    match params.strategies.service_leave {
        BasicStrategy::Basic => leave_sweep(
            state.services().keys().copied(),
            params.behavior.service_leave_probability,
            rng,
        ),
    }
}

/// Each servicer links one more service with some probability.
///
/// A servicer admitted this block links with
/// `service_linking_probability_just_joined`, every other one with
/// `service_linking_probability_normal`. The new service is picked
/// uniformly among those it does not offer yet. Servicers at their link
/// cap still consume the decision draw.
pub fn service_linking_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Vec<LinkServiceSpace> {
    match params.strategies.service_linking {
        BasicStrategy::Basic => {
            let behavior = &params.behavior;
            let cap = link_cap(params);
            let mut out = Vec::new();
            for servicer in state.servicers().values() {
                let probability = if servicer.just_joined(state.height()) {
                    behavior.service_linking_probability_just_joined
                } else {
                    behavior.service_linking_probability_normal
                };
                if rng.uniform() >= probability || servicer.services.len() >= cap {
                    continue;
                }
                let candidates: Vec<AgentId> = state
                    .services()
                    .keys()
                    .copied()
                    .filter(|s| !servicer.offers(*s))
                    .collect();
                if let Some(i) = rng.choose_index(candidates.len()) {
                    out.push(LinkServiceSpace {
                        servicer: servicer.id,
                        service: candidates[i],
                    });
                }
            }
            out
        }
    }
}

/// Each servicer offering something drops one service with
/// `service_unlinking_probability`.
///
/// With `kick_bottom_probability` the dropped service is the one with the
/// lowest revenue expectation, otherwise a uniformly random one.
pub fn service_unlinking_ba(
    state: &WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Vec<UnlinkServiceSpace> {
    match params.strategies.service_unlinking {
        BasicStrategy::Basic => {
            let behavior = &params.behavior;
            let mut out = Vec::new();
            for servicer in state.servicers().values() {
                if servicer.services.is_empty() {
                    continue;
                }
                if rng.uniform() >= behavior.service_unlinking_probability {
                    continue;
                }
                let service = if rng.uniform() < behavior.kick_bottom_probability {
                    bottom_service(servicer)
                } else {
                    rng.choose_index(servicer.services.len())
                        .map(|i| servicer.services[i])
                };
                if let Some(service) = service {
                    out.push(UnlinkServiceSpace {
                        servicer: servicer.id,
                        service,
                    });
                }
            }
            out
        }
    }
}

/// The linked service with the lowest revenue expectation. A service that
/// has not earned anything yet ranks below every earning one.
fn bottom_service(servicer: &Servicer) -> Option<AgentId> {
    servicer
        .services
        .iter()
        .copied()
        .find(|s| !servicer.revenue_expectations.contains_key(s))
        .or_else(|| {
            servicer
                .services_by_revenue()
                .into_iter()
                .map(|(service, _)| service)
                .find(|s| servicer.offers(*s))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::params::ParamTable;
    use pokt_env::ScriptedRandomness;

    fn params_with(f: impl FnOnce(&mut ParamTable)) -> ParamSet {
        let mut table = ParamTable::test();
        f(&mut table);
        ParamSet::from_table(table).unwrap()
    }

    fn world(services: usize, links: &[&[u64]]) -> WorldState {
        let mut state = WorldState::new();
        for i in 0..services {
            state.add_service(format!("svc-{}", i));
        }
        for linked in links {
            let linked: Vec<AgentId> = linked.iter().map(|i| AgentId(*i)).collect();
            state
                .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, linked, "ABC", 1.0))
                .unwrap();
        }
        state
    }

    #[test]
    fn test_service_join_respects_catalog_cap() {
        let params = params_with(|t| t.behavior.service_max_number = 4);
        let mut rng = ScriptedRandomness::new().with_uniforms([0.8, 0.7]);

        assert!(service_join_ba(&world(3, &[]), &params, &mut rng).is_fired());
        assert!(service_join_ba(&world(3, &[]), &params, &mut rng).is_skipped());
        assert!(service_join_ba(&world(4, &[]), &params, &mut ScriptedRandomness::new()).is_skipped());
    }

    #[test]
    fn test_just_joined_servicer_links_more_readily() {
        let params = params_with(|t| {
            t.behavior.service_linking_probability_normal = 0.1;
            t.behavior.service_linking_probability_just_joined = 0.5;
        });
        let mut state = world(3, &[&[0]]);
        state.advance_height();
        state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![AgentId(1)], "ABC", 1.0))
            .unwrap();

        // 0.3 misses the normal rate but hits the just-joined rate
        let mut rng = ScriptedRandomness::new().with_uniforms([0.3, 0.3]).with_choices([1]);
        let links = service_linking_ba(&state, &params, &mut rng);
        assert_eq!(
            links,
            vec![LinkServiceSpace { servicer: AgentId(1), service: AgentId(2) }]
        );
    }

    #[test]
    fn test_linking_skips_servicers_at_cap() {
        let params = params_with(|t| {
            t.behavior.service_linking_probability_normal = 1.0;
            t.behavior.service_max_number_link = 1;
        });
        let state = world(2, &[&[0], &[]]);
        let mut rng = ScriptedRandomness::new().with_uniforms([0.0, 0.0]);

        let links = service_linking_ba(&state, &params, &mut rng);
        assert_eq!(links, vec![LinkServiceSpace { servicer: AgentId(1), service: AgentId(0) }]);
        assert_eq!(rng.remaining_uniforms(), 0);
    }

    #[test]
    fn test_unlinking_kicks_lowest_revenue_service() {
        let params = params_with(|t| {
            t.behavior.service_unlinking_probability = 1.0;
            t.behavior.kick_bottom_probability = 0.5;
        });
        let mut state = world(3, &[&[0, 1, 2]]);
        for (service, revenue) in [(0, 50.0), (1, 10.0), (2, 30.0)] {
            state
                .credit_servicer_revenue(AgentId(0), Some(AgentId(service)), revenue, 0.9)
                .unwrap();
        }

        let mut rng = ScriptedRandomness::new().with_uniforms([0.0, 0.2]);
        assert_eq!(
            service_unlinking_ba(&state, &params, &mut rng),
            vec![UnlinkServiceSpace { servicer: AgentId(0), service: AgentId(1) }]
        );

        // above the kick-bottom threshold the service is drawn at random
        let mut rng = ScriptedRandomness::new().with_uniforms([0.0, 0.9]).with_choices([2]);
        assert_eq!(
            service_unlinking_ba(&state, &params, &mut rng),
            vec![UnlinkServiceSpace { servicer: AgentId(0), service: AgentId(2) }]
        );
    }

    #[test]
    fn test_unearned_service_ranks_bottom() {
        let mut state = world(2, &[&[0, 1]]);
        state
            .credit_servicer_revenue(AgentId(0), Some(AgentId(0)), 5.0, 0.9)
            .unwrap();
        assert_eq!(bottom_service(state.servicer(AgentId(0)).unwrap()), Some(AgentId(1)));
    }

    #[test]
    fn test_unlinking_ignores_serviceless_servicers() {
        let params = params_with(|t| t.behavior.service_unlinking_probability = 1.0);
        let state = world(1, &[&[]]);
        let mut rng = ScriptedRandomness::new().with_uniforms([0.0]);
        assert!(service_unlinking_ba(&state, &params, &mut rng).is_empty());
        assert_eq!(rng.remaining_uniforms(), 1);
    }
}
