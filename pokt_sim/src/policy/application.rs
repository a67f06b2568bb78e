//! Application-side policies: admission, delegation, staking and the V1
//! session admission policy for relay requests.

use super::{removal_policy, stake_transfer_policy};
use pokt_core::params::SubmitRelayPolicy;
use pokt_core::spaces::{
    ApplicationJoinSpace, BurnSpace, DelegationSpace, LeaveSpace, NewSessionSpace,
    RemoveAgentSpace, SessionAdmissionSpaces, StakeSpace, StakeTransferSpaces,
    SubmitRelayRequestSpace,
};
use pokt_core::{Application, ParamSet, Payer, Servicer, Stage, WorldState};
use pokt_env::{AgentId, AgentKey, AgentKind};

fn is_amount(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// Validates a joining application; unknown services are dropped and the
/// per-session servicer count is clamped to the protocol bounds.
pub fn application_join_policy(
    state: &WorldState,
    params: &ParamSet,
    space: ApplicationJoinSpace,
) -> Stage<ApplicationJoinSpace> {
    if !is_amount(space.stake_amount) || !is_amount(space.personal_holdings) {
        return Stage::Skipped;
    }
    let services = space
        .services
        .into_iter()
        .filter(|s| state.services().contains_key(s))
        .collect();
    let number_servicers = space.number_servicers.clamp(
        params.system.minimum_servicers_per_session,
        params.system.maximum_servicers_per_session,
    );

    Stage::Fired(ApplicationJoinSpace {
        services,
        number_servicers,
        ..space
    })
}

/// Accepts a delegation only if the application is still undelegated and
/// the gateway can back one more delegator.
pub fn gateway_delegation_policy(
    state: &WorldState,
    params: &ParamSet,
    space: &DelegationSpace,
) -> Stage<DelegationSpace> {
    let (Some(application), Some(gateway)) =
        (state.application(space.application), state.gateway(space.gateway))
    else {
        return Stage::Skipped;
    };
    if application.is_delegated() || state.understaked_gateways().contains(&gateway.id) {
        return Stage::Skipped;
    }
    let required = params.system.stake_per_app_delegation * (gateway.delegators.len() + 1) as f64;
    if gateway.staked_pokt < required {
        return Stage::Skipped;
    }
    Stage::Fired(*space)
}

/// Accepts an undelegation if the link still exists.
pub fn gateway_undelegation_policy(state: &WorldState, space: &DelegationSpace) -> Stage<DelegationSpace> {
    match state.application(space.application) {
        Some(application) if application.delegate == Some(space.gateway) => Stage::Fired(*space),
        _ => Stage::Skipped,
    }
}

pub fn application_stake_policy(state: &WorldState, space: &StakeSpace) -> Stage<StakeTransferSpaces> {
    if space.public_key.kind != AgentKind::Application {
        return Stage::Skipped;
    }
    stake_transfer_policy(state, space)
}

pub fn application_leave_policy(state: &WorldState, leave: &LeaveSpace) -> Vec<RemoveAgentSpace> {
    removal_policy(state, leave, AgentKey::application)
}

// =============================================================================
// SESSION ADMISSION
// =============================================================================

/// Resolves a relay request into a session to open.
///
/// Skipped when no relays were requested, the application is gone, or no
/// eligible servicer exists.
pub fn submit_relay_requests_policy(
    state: &WorldState,
    params: &ParamSet,
    space: &SubmitRelayRequestSpace,
) -> Stage<SessionAdmissionSpaces> {
    match params.strategies.submit_relay_requests_policy {
        SubmitRelayPolicy::V1 => submit_relay_requests_policy_v1(state, params, space),
    }
}

/// V1: the application's first declared service picks the servicer pool;
/// unjailed servicers offering it are ranked by QoS (ties by id) and the
/// best `n` are assigned, with `n` clamped to the protocol session bounds.
/// The new session replaces any session the application still has open.
fn submit_relay_requests_policy_v1(
    state: &WorldState,
    params: &ParamSet,
    space: &SubmitRelayRequestSpace,
) -> Stage<SessionAdmissionSpaces> {
    if space.number_of_requests == 0 {
        return Stage::Skipped;
    }
    let Some(application) = state.application(space.application) else {
        return Stage::Skipped;
    };

    let service = application.services.first().copied();
    let servicers = select_servicers(state, service, session_size(params, space));
    if servicers.is_empty() {
        return Stage::Skipped;
    }

    let payer = payer_for(state, application);
    let burn = state.agent(payer.key()).and_then(|agent| {
        let amount = params.system.app_burn_per_session.min(agent.staked_pokt());
        (amount > 0.0).then_some(BurnSpace {
            public_key: payer.key(),
            amount,
        })
    });

    let superseded = state
        .sessions()
        .values()
        .filter(|session| session.application == application.id)
        .map(|session| session.id)
        .collect();

    Stage::Fired(SessionAdmissionSpaces {
        session: NewSessionSpace {
            application: application.id,
            payer,
            servicers,
            service,
            number_of_relays: space.number_of_requests,
        },
        superseded,
        burn,
    })
}

fn session_size(params: &ParamSet, space: &SubmitRelayRequestSpace) -> usize {
    space.number_of_servicers.clamp(
        params.system.minimum_servicers_per_session,
        params.system.maximum_servicers_per_session,
    )
}

fn select_servicers(state: &WorldState, service: Option<AgentId>, n: usize) -> Vec<AgentId> {
    let mut eligible: Vec<&Servicer> = state
        .servicers()
        .values()
        .filter(|s| !s.is_jailed())
        .filter(|s| service.map_or(true, |svc| s.offers(svc)))
        .collect();
    eligible.sort_by(|a, b| b.qos.total_cmp(&a.qos).then(a.id.cmp(&b.id)));
    eligible.into_iter().take(n).map(|s| s.id).collect()
}

/// The delegate gateway pays if the application has one that still exists.
fn payer_for(state: &WorldState, application: &Application) -> Payer {
    match application.delegate {
        Some(gateway) if state.gateway(gateway).is_some() => Payer::Gateway(gateway),
        _ => Payer::Application(application.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::params::ParamTable;
    use pokt_core::Gateway;

    fn params_with(f: impl FnOnce(&mut ParamTable)) -> ParamSet {
        let mut table = ParamTable::test();
        f(&mut table);
        ParamSet::from_table(table).unwrap()
    }

    struct Fixture {
        state: WorldState,
        app: AgentId,
        gateway: AgentId,
    }

    fn fixture() -> Fixture {
        let mut state = WorldState::new();
        let eth = state.add_service("eth");
        let sol = state.add_service("sol");
        for (qos, services) in [(0.5, vec![eth]), (0.9, vec![eth]), (1.0, vec![sol]), (0.9, vec![eth, sol])] {
            state
                .admit_servicer(|id| Servicer::new(id, "", 0.0, 1e11, services, "ABC", qos))
                .unwrap();
        }
        let app = state
            .admit_application(|id| Application::new(id, "", 100.0, 1e9, vec![eth], "ABC", 1))
            .unwrap();
        let gateway = state
            .admit_gateway(|id| Gateway::new(id, "", 0.0, 1.5e12))
            .unwrap();
        Fixture { state, app, gateway }
    }

    fn request(app: AgentId, relays: u64, servicers: usize) -> SubmitRelayRequestSpace {
        SubmitRelayRequestSpace {
            application: app,
            number_of_requests: relays,
            number_of_servicers: servicers,
        }
    }

    #[test]
    fn test_v1_ranks_by_qos_then_id() {
        let f = fixture();
        let params = params_with(|_| {});

        let admission = submit_relay_requests_policy(&f.state, &params, &request(f.app, 50, 2))
            .fired()
            .unwrap();
        assert_eq!(admission.session.servicers, vec![AgentId(1), AgentId(3)]);
        assert_eq!(admission.session.payer, Payer::Application(f.app));
        assert_eq!(admission.session.service, Some(AgentId(0)));
        assert!(admission.burn.is_none());
    }

    #[test]
    fn test_v1_supersedes_open_sessions_of_application() {
        let mut f = fixture();
        let other = f
            .state
            .admit_application(|id| Application::new(id, "", 0.0, 1e9, vec![AgentId(0)], "ABC", 1))
            .unwrap();
        let mut open = |application| {
            f.state
                .create_session(&NewSessionSpace {
                    application,
                    payer: Payer::Application(application),
                    servicers: vec![AgentId(1)],
                    service: Some(AgentId(0)),
                    number_of_relays: 5,
                })
                .unwrap()
        };
        let first = open(f.app);
        open(other);
        let second = open(f.app);

        let params = params_with(|_| {});
        let admission = submit_relay_requests_policy(&f.state, &params, &request(f.app, 50, 1))
            .fired()
            .unwrap();
        assert_eq!(admission.superseded, vec![first, second]);
    }

    #[test]
    fn test_v1_clamps_session_size() {
        let f = fixture();
        let params = params_with(|t| t.system.maximum_servicers_per_session = 1);
        let admission = submit_relay_requests_policy(&f.state, &params, &request(f.app, 50, 3))
            .fired()
            .unwrap();
        assert_eq!(admission.session.servicers.len(), 1);
    }

    #[test]
    fn test_v1_excludes_jailed_servicers() {
        let mut f = fixture();
        for id in [0, 1, 3] {
            f.state.set_pause_height(AgentId(id), Some(0)).unwrap();
        }
        let params = params_with(|_| {});
        assert!(submit_relay_requests_policy(&f.state, &params, &request(f.app, 50, 2)).is_skipped());
    }

    #[test]
    fn test_v1_zero_relays_is_skipped() {
        let f = fixture();
        let params = params_with(|_| {});
        assert!(submit_relay_requests_policy(&f.state, &params, &request(f.app, 0, 2)).is_skipped());
    }

    #[test]
    fn test_v1_delegate_pays_and_burn_is_clamped() {
        let mut f = fixture();
        f.state.link_delegation(f.app, f.gateway).unwrap();
        let params = params_with(|t| t.system.app_burn_per_session = 2e12);

        let admission = submit_relay_requests_policy(&f.state, &params, &request(f.app, 5, 1))
            .fired()
            .unwrap();
        assert_eq!(admission.session.payer, Payer::Gateway(f.gateway));
        let burn = admission.burn.unwrap();
        assert_eq!(burn.public_key, AgentKey::gateway(f.gateway));
        assert_eq!(burn.amount, 1.5e12);
    }

    #[test]
    fn test_delegation_requires_stake_for_one_more() {
        let mut f = fixture();
        let params = params_with(|_| {});
        let space = DelegationSpace { application: f.app, gateway: f.gateway };
        assert!(gateway_delegation_policy(&f.state, &params, &space).is_fired());

        // 1.5e12 backs ten delegations of 1.5e11 each
        for _ in 0..10 {
            let other = f
                .state
                .admit_application(|id| Application::new(id, "", 0.0, 0.0, vec![], "ABC", 1))
                .unwrap();
            f.state.link_delegation(other, f.gateway).unwrap();
        }
        assert!(gateway_delegation_policy(&f.state, &params, &space).is_skipped());
    }

    #[test]
    fn test_delegation_refuses_understaked_gateway() {
        let mut f = fixture();
        f.state.set_understaked(f.gateway, true).unwrap();
        let params = params_with(|_| {});
        let space = DelegationSpace { application: f.app, gateway: f.gateway };
        assert!(gateway_delegation_policy(&f.state, &params, &space).is_skipped());
    }

    #[test]
    fn test_undelegation_requires_link() {
        let mut f = fixture();
        let space = DelegationSpace { application: f.app, gateway: f.gateway };
        assert!(gateway_undelegation_policy(&f.state, &space).is_skipped());

        f.state.link_delegation(f.app, f.gateway).unwrap();
        assert!(gateway_undelegation_policy(&f.state, &space).is_fired());
    }

    #[test]
    fn test_join_policy_drops_unknown_services() {
        let f = fixture();
        let params = params_with(|_| {});
        let space = ApplicationJoinSpace {
            name: String::new(),
            stake_amount: 15000.0,
            geo_zone: "ABC".to_string(),
            number_servicers: 9,
            personal_holdings: 100.0,
            services: vec![AgentId(0), AgentId(42)],
        };

        let accepted = application_join_policy(&f.state, &params, space.clone()).fired().unwrap();
        assert_eq!(accepted.services, vec![AgentId(0)]);
        assert_eq!(accepted.number_servicers, params.system.maximum_servicers_per_session);

        let negative = ApplicationJoinSpace { stake_amount: -1.0, ..space };
        assert!(application_join_policy(&f.state, &params, negative).is_skipped());
    }
}
