//! Service lifecycle policies: catalog admission, departures and the
//! servicer link/unlink checks.

use pokt_core::spaces::{
    LeaveSpace, LinkServiceSpace, RemoveAgentSpace, ServiceJoinSpace, ServiceLeaveSpaces,
    UnlinkServiceSpace,
};
use pokt_core::{ParamSet, Stage, WorldState};
use pokt_env::AgentKey;

/// Admits a new service while the catalog is below `service_max_number`.
pub fn service_join_policy(
    state: &WorldState,
    params: &ParamSet,
    space: ServiceJoinSpace,
) -> Stage<ServiceJoinSpace> {
    if state.services().len() >= params.behavior.service_max_number {
        return Stage::Skipped;
    }
    Stage::Fired(space)
}

/// Every servicer offering a departing service unlinks it, then the
/// service is removed.
pub fn service_leave_policy(state: &WorldState, leave: &LeaveSpace) -> ServiceLeaveSpaces {
    let mut out = ServiceLeaveSpaces::default();
    for id in leave.leaving() {
        let Some(service) = state.services().get(&id) else {
            continue;
        };
        out.unlinks.extend(service.servicers.iter().map(|servicer| UnlinkServiceSpace {
            servicer: *servicer,
            service: id,
        }));
        out.removals.push(RemoveAgentSpace {
            public_key: AgentKey::service(id),
        });
    }
    out
}

/// A link is valid when both ends exist, the servicer does not offer the
/// service yet and stays within `max_chains_servicer`.
pub fn service_linking_policy(
    state: &WorldState,
    params: &ParamSet,
    space: &LinkServiceSpace,
) -> Stage<LinkServiceSpace> {
    let Some(servicer) = state.servicer(space.servicer) else {
        return Stage::Skipped;
    };
    if !state.services().contains_key(&space.service)
        || servicer.offers(space.service)
        || servicer.services.len() >= params.system.max_chains_servicer
    {
        return Stage::Skipped;
    }
    Stage::Fired(*space)
}

pub fn service_unlinking_policy(state: &WorldState, space: &UnlinkServiceSpace) -> Stage<UnlinkServiceSpace> {
    match state.servicer(space.servicer) {
        Some(servicer) if servicer.offers(space.service) => Stage::Fired(*space),
        _ => Stage::Skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::params::ParamTable;
    use pokt_core::Servicer;
    use pokt_env::AgentId;
    use std::collections::BTreeMap;

    fn world() -> WorldState {
        let mut state = WorldState::new();
        let eth = state.add_service("eth");
        let sol = state.add_service("sol");
        state.add_service("poly");
        for services in [vec![eth, sol], vec![eth]] {
            state
                .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, services, "ABC", 1.0))
                .unwrap();
        }
        state
    }

    #[test]
    fn test_join_refused_at_catalog_cap() {
        let mut table = ParamTable::test();
        table.behavior.service_max_number = 3;
        let params = ParamSet::from_table(table).unwrap();
        let space = ServiceJoinSpace { name: "near".to_string() };
        assert!(service_join_policy(&world(), &params, space.clone()).is_skipped());

        let params = ParamSet::preset("test").unwrap();
        assert_eq!(service_join_policy(&world(), &params, space.clone()), Stage::Fired(space));
    }

    #[test]
    fn test_leave_unlinks_every_servicer() {
        let state = world();
        let leave = LeaveSpace {
            decisions: BTreeMap::from([(AgentId(0), true), (AgentId(1), false), (AgentId(9), true)]),
        };

        let spaces = service_leave_policy(&state, &leave);
        assert_eq!(
            spaces.unlinks,
            vec![
                UnlinkServiceSpace { servicer: AgentId(0), service: AgentId(0) },
                UnlinkServiceSpace { servicer: AgentId(1), service: AgentId(0) },
            ]
        );
        assert_eq!(spaces.removals, vec![RemoveAgentSpace { public_key: AgentKey::service(AgentId(0)) }]);
    }

    #[test]
    fn test_linking_checks_both_ends_and_cap() {
        let state = world();
        let params = ParamSet::preset("test").unwrap();
        let link = |servicer, service| LinkServiceSpace {
            servicer: AgentId(servicer),
            service: AgentId(service),
        };

        assert!(service_linking_policy(&state, &params, &link(1, 2)).is_fired());
        assert!(service_linking_policy(&state, &params, &link(1, 0)).is_skipped());
        assert!(service_linking_policy(&state, &params, &link(1, 7)).is_skipped());
        assert!(service_linking_policy(&state, &params, &link(5, 2)).is_skipped());

        let mut table = ParamTable::test();
        table.system.max_chains_servicer = 2;
        let capped = ParamSet::from_table(table).unwrap();
        assert!(service_linking_policy(&state, &capped, &link(0, 2)).is_skipped());
    }

    #[test]
    fn test_unlinking_requires_existing_link() {
        let state = world();
        let unlink = |service| UnlinkServiceSpace { servicer: AgentId(1), service: AgentId(service) };
        assert!(service_unlinking_policy(&state, &unlink(0)).is_fired());
        assert!(service_unlinking_policy(&state, &unlink(1)).is_skipped());
    }
}
