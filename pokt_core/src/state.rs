//! World State: the single owner of every agent, session and counter.
//!
//! Mechanisms never touch agent fields directly. They call the narrow
//! mutation methods below, which are the one place the invariants live:
//! - balances never go negative (`StateInvariantError::NegativeBalance`)
//! - removing an agent scrubs every back-reference to it (delegations,
//!   service links, session membership)
//! - identifiers come from the state's own allocator, so trials never share
//!   a counter

use crate::agent::Staker;
use crate::application::Application;
use crate::error::StateInvariantError;
use crate::gateway::Gateway;
use crate::service::Service;
use crate::servicer::Servicer;
use crate::session::{Payer, Session};
use crate::spaces::{NewSessionSpace, ProtocolFeeSpace};
use pokt_env::{AgentId, AgentKey, AgentKind, BlockHeight, SessionId, Upokt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-trial identifier allocator; one monotonic counter per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdAllocator {
    servicers: u64,
    applications: u64,
    gateways: u64,
    services: u64,
    sessions: u64,
}

impl IdAllocator {
    fn counter(&mut self, kind: AgentKind) -> &mut u64 {
        match kind {
            AgentKind::Servicer => &mut self.servicers,
            AgentKind::Application => &mut self.applications,
            AgentKind::Gateway => &mut self.gateways,
            AgentKind::Service => &mut self.services,
        }
    }

    /// The identifier `next_agent` would issue for `kind`, without issuing it.
    pub fn peek_agent(&self, kind: AgentKind) -> AgentId {
        AgentId(match kind {
            AgentKind::Servicer => self.servicers,
            AgentKind::Application => self.applications,
            AgentKind::Gateway => self.gateways,
            AgentKind::Service => self.services,
        })
    }

    /// Issues the next identifier for `kind`.
    pub fn next_agent(&mut self, kind: AgentKind) -> AgentId {
        let counter = self.counter(kind);
        let id = AgentId(*counter);
        *counter += 1;
        id
    }

    /// Issues the next session identifier.
    pub fn next_session(&mut self) -> SessionId {
        let id = SessionId(self.sessions);
        self.sessions += 1;
        id
    }
}

/// Protocol-level accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolLedger {
    /// Relay-payment share accrued to the DAO
    pub dao: Upokt,

    /// Relay-payment share accrued to block proposers
    pub block_proposer: Upokt,

    /// POKT removed from circulation (slashes, relay and session burns)
    pub burned: Upokt,
}

impl ProtocolLedger {
    /// Accumulated protocol fees (DAO + proposer).
    pub fn protocol_fees(&self) -> Upokt {
        self.dao + self.block_proposer
    }
}

/// The mutable aggregate for one trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    height: BlockHeight,
    servicers: BTreeMap<AgentId, Servicer>,
    applications: BTreeMap<AgentId, Application>,
    gateways: BTreeMap<AgentId, Gateway>,
    services: BTreeMap<AgentId, Service>,
    sessions: BTreeMap<SessionId, Session>,
    understaked_gateways: BTreeSet<AgentId>,
    ledger: ProtocolLedger,
    ids: IdAllocator,
}

fn apply_delta(
    agent: AgentKey,
    field: &'static str,
    balance: &mut Upokt,
    delta: Upokt,
) -> Result<Upokt, StateInvariantError> {
    if !delta.is_finite() {
        return Err(StateInvariantError::NonFiniteAmount { agent, delta });
    }
    let next = *balance + delta;
    if next < 0.0 {
        return Err(StateInvariantError::NegativeBalance {
            agent,
            field,
            balance: *balance,
            delta,
        });
    }
    *balance = next;
    Ok(next)
}

fn check_balances(agent: &dyn Staker) -> Result<(), StateInvariantError> {
    for (field, value) in [
        ("pokt_holdings", agent.pokt_holdings()),
        ("staked_pokt", agent.staked_pokt()),
    ] {
        if !value.is_finite() {
            return Err(StateInvariantError::NonFiniteAmount {
                agent: agent.key(),
                delta: value,
            });
        }
        if value < 0.0 {
            return Err(StateInvariantError::NegativeBalance {
                agent: agent.key(),
                field,
                balance: 0.0,
                delta: value,
            });
        }
    }
    Ok(())
}

impl WorldState {
    /// Creates an empty world at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn servicers(&self) -> &BTreeMap<AgentId, Servicer> {
        &self.servicers
    }

    pub fn applications(&self) -> &BTreeMap<AgentId, Application> {
        &self.applications
    }

    pub fn gateways(&self) -> &BTreeMap<AgentId, Gateway> {
        &self.gateways
    }

    pub fn services(&self) -> &BTreeMap<AgentId, Service> {
        &self.services
    }

    pub fn sessions(&self) -> &BTreeMap<SessionId, Session> {
        &self.sessions
    }

    pub fn understaked_gateways(&self) -> &BTreeSet<AgentId> {
        &self.understaked_gateways
    }

    pub fn ledger(&self) -> &ProtocolLedger {
        &self.ledger
    }

    pub fn servicer(&self, id: AgentId) -> Option<&Servicer> {
        self.servicers.get(&id)
    }

    pub fn application(&self, id: AgentId) -> Option<&Application> {
        self.applications.get(&id)
    }

    pub fn gateway(&self, id: AgentId) -> Option<&Gateway> {
        self.gateways.get(&id)
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// The most recently opened session still active.
    pub fn latest_session(&self) -> Option<&Session> {
        self.sessions.last_key_value().map(|(_, session)| session)
    }

    /// Any staked agent by identity token.
    pub fn agent(&self, key: AgentKey) -> Option<&dyn Staker> {
        match key.kind {
            AgentKind::Servicer => self.servicers.get(&key.id).map(|a| a as &dyn Staker),
            AgentKind::Application => self.applications.get(&key.id).map(|a| a as &dyn Staker),
            AgentKind::Gateway => self.gateways.get(&key.id).map(|a| a as &dyn Staker),
            AgentKind::Service => None,
        }
    }

    /// Every agent balance plus fees held by the protocol (burned POKT excluded).
    pub fn circulating_supply(&self) -> Upokt {
        let servicers: Upokt = self.servicers.values().map(|a| a.total_pokt()).sum();
        let applications: Upokt = self.applications.values().map(|a| a.total_pokt()).sum();
        let gateways: Upokt = self.gateways.values().map(|a| a.total_pokt()).sum();
        servicers + applications + gateways + self.ledger.protocol_fees()
    }

    /// Verifies non-negativity of every balance.
    pub fn check_invariants(&self) -> Result<(), StateInvariantError> {
        for s in self.servicers.values() {
            check_balances(s)?;
        }
        for a in self.applications.values() {
            check_balances(a)?;
        }
        for g in self.gateways.values() {
            check_balances(g)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Time
    // -------------------------------------------------------------------------

    /// Moves to the next block and returns the new height.
    pub fn advance_height(&mut self) -> BlockHeight {
        self.height += 1;
        self.height
    }

    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------

    /// Registers a new service in the catalog.
    pub fn add_service(&mut self, name: impl Into<String>) -> AgentId {
        let id = self.ids.next_agent(AgentKind::Service);
        self.services.insert(id, Service::new(id, name));
        id
    }

    fn check_services(&self, services: &[AgentId]) -> Result<(), StateInvariantError> {
        match services.iter().find(|s| !self.services.contains_key(s)) {
            Some(missing) => Err(StateInvariantError::UnknownAgent(AgentKey::service(*missing))),
            None => Ok(()),
        }
    }

    /// Admits a servicer built around a freshly allocated id and links it
    /// to its services. A rejected servicer does not consume an id.
    pub fn admit_servicer(
        &mut self,
        build: impl FnOnce(AgentId) -> Servicer,
    ) -> Result<AgentId, StateInvariantError> {
        let id = self.ids.peek_agent(AgentKind::Servicer);
        let mut servicer = build(id);
        servicer.id = id;
        servicer.join_height = self.height;
        check_balances(&servicer)?;
        self.check_services(&servicer.services)?;
        self.ids.next_agent(AgentKind::Servicer);

        for service in &servicer.services {
            if let Some(entry) = self.services.get_mut(service) {
                entry.servicers.insert(id);
            }
        }
        self.servicers.insert(id, servicer);
        Ok(id)
    }

    /// Admits an application built around a freshly allocated id.
    pub fn admit_application(
        &mut self,
        build: impl FnOnce(AgentId) -> Application,
    ) -> Result<AgentId, StateInvariantError> {
        let id = self.ids.peek_agent(AgentKind::Application);
        let mut application = build(id);
        application.id = id;
        application.delegate = None;
        check_balances(&application)?;
        self.check_services(&application.services)?;
        self.ids.next_agent(AgentKind::Application);

        self.applications.insert(id, application);
        Ok(id)
    }

    /// Admits a gateway built around a freshly allocated id.
    pub fn admit_gateway(
        &mut self,
        build: impl FnOnce(AgentId) -> Gateway,
    ) -> Result<AgentId, StateInvariantError> {
        let id = self.ids.peek_agent(AgentKind::Gateway);
        let mut gateway = build(id);
        gateway.id = id;
        gateway.delegators.clear();
        check_balances(&gateway)?;
        self.ids.next_agent(AgentKind::Gateway);

        self.gateways.insert(id, gateway);
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Balances
    // -------------------------------------------------------------------------

    fn staker_mut(&mut self, key: AgentKey) -> Result<&mut dyn Staker, StateInvariantError> {
        let agent: Option<&mut dyn Staker> = match key.kind {
            AgentKind::Servicer => self.servicers.get_mut(&key.id).map(|a| a as &mut dyn Staker),
            AgentKind::Application => self.applications.get_mut(&key.id).map(|a| a as &mut dyn Staker),
            AgentKind::Gateway => self.gateways.get_mut(&key.id).map(|a| a as &mut dyn Staker),
            AgentKind::Service => None,
        };
        agent.ok_or(StateInvariantError::UnknownAgent(key))
    }

    /// Adds a signed delta to an agent's liquid balance.
    pub fn adjust_holdings(&mut self, key: AgentKey, delta: Upokt) -> Result<Upokt, StateInvariantError> {
        let agent = self.staker_mut(key)?;
        apply_delta(key, "pokt_holdings", agent.pokt_holdings_mut(), delta)
    }

    /// Adds a signed delta to an agent's escrow.
    pub fn adjust_stake(&mut self, key: AgentKey, delta: Upokt) -> Result<Upokt, StateInvariantError> {
        let agent = self.staker_mut(key)?;
        let next = apply_delta(key, "staked_pokt", agent.staked_pokt_mut(), delta)?;
        if key.kind == AgentKind::Servicer && delta > 0.0 {
            if let Some(servicer) = self.servicers.get_mut(&key.id) {
                servicer.staked_pokt_total_inflow += delta;
            }
        }
        Ok(next)
    }

    /// Removes `amount` from an agent's escrow and from circulation.
    pub fn burn_stake(&mut self, key: AgentKey, amount: Upokt) -> Result<Upokt, StateInvariantError> {
        if amount < 0.0 {
            return Err(StateInvariantError::NegativeAmount {
                field: "burned",
                amount,
            });
        }
        let next = self.adjust_stake(key, -amount)?;
        self.ledger.burned += amount;
        Ok(next)
    }

    /// Credits the protocol share of a relay payment.
    pub fn collect_fees(&mut self, fees: &ProtocolFeeSpace) -> Result<(), StateInvariantError> {
        for (field, amount) in [("dao", fees.dao), ("block_proposer", fees.block_proposer)] {
            if !(amount >= 0.0 && amount.is_finite()) {
                return Err(StateInvariantError::NegativeAmount { field, amount });
            }
        }
        self.ledger.dao += fees.dao;
        self.ledger.block_proposer += fees.block_proposer;
        Ok(())
    }

    /// Pays relay revenue into a servicer's holdings and updates its
    /// revenue expectation for the served service.
    pub fn credit_servicer_revenue(
        &mut self,
        id: AgentId,
        service: Option<AgentId>,
        amount: Upokt,
        lambda: f64,
    ) -> Result<(), StateInvariantError> {
        let key = AgentKey::servicer(id);
        let servicer = self
            .servicers
            .get_mut(&id)
            .ok_or(StateInvariantError::UnknownAgent(key))?;
        apply_delta(key, "pokt_holdings", &mut servicer.pokt_holdings, amount)?;
        servicer.total_revenues += amount;
        if let Some(service) = service {
            servicer.observe_revenue(service, amount, lambda);
        }
        Ok(())
    }

    /// Tracks fees a gateway paid on behalf of its delegators.
    pub fn add_fees_paid(&mut self, id: AgentId, amount: Upokt) -> Result<(), StateInvariantError> {
        let key = AgentKey::gateway(id);
        let gateway = self
            .gateways
            .get_mut(&id)
            .ok_or(StateInvariantError::UnknownAgent(key))?;
        apply_delta(key, "fees_paid", &mut gateway.fees_paid, amount)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Delegation
    // -------------------------------------------------------------------------

    /// Links an application to a gateway, replacing any previous delegate.
    pub fn link_delegation(&mut self, application: AgentId, gateway: AgentId) -> Result<(), StateInvariantError> {
        if !self.gateways.contains_key(&gateway) {
            return Err(StateInvariantError::UnknownAgent(AgentKey::gateway(gateway)));
        }
        if !self.applications.contains_key(&application) {
            return Err(StateInvariantError::UnknownAgent(AgentKey::application(application)));
        }
        self.unlink_delegation(application)?;

        if let Some(app) = self.applications.get_mut(&application) {
            app.delegate = Some(gateway);
        }
        if let Some(g) = self.gateways.get_mut(&gateway) {
            g.delegators.insert(application);
        }
        Ok(())
    }

    /// Clears an application's delegate on both sides; returns the former gateway.
    pub fn unlink_delegation(&mut self, application: AgentId) -> Result<Option<AgentId>, StateInvariantError> {
        let app = self
            .applications
            .get_mut(&application)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::application(application)))?;
        let former = app.delegate.take();
        if let Some(gateway) = former.and_then(|g| self.gateways.get_mut(&g)) {
            gateway.delegators.remove(&application);
        }
        Ok(former)
    }

    /// Marks or clears a gateway as understaked.
    pub fn set_understaked(&mut self, gateway: AgentId, understaked: bool) -> Result<(), StateInvariantError> {
        if !self.gateways.contains_key(&gateway) {
            return Err(StateInvariantError::UnknownAgent(AgentKey::gateway(gateway)));
        }
        if understaked {
            self.understaked_gateways.insert(gateway);
        } else {
            self.understaked_gateways.remove(&gateway);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Opens a session at the current height.
    pub fn create_session(&mut self, space: &NewSessionSpace) -> Result<SessionId, StateInvariantError> {
        if !self.applications.contains_key(&space.application) {
            return Err(StateInvariantError::UnknownAgent(AgentKey::application(space.application)));
        }
        if self.agent(space.payer.key()).is_none() {
            return Err(StateInvariantError::UnknownAgent(space.payer.key()));
        }
        if let Some(missing) = space.servicers.iter().find(|s| !self.servicers.contains_key(s)) {
            return Err(StateInvariantError::UnknownAgent(AgentKey::servicer(*missing)));
        }

        let id = self.ids.next_session();
        self.sessions.insert(
            id,
            Session {
                id,
                application: space.application,
                payer: space.payer,
                servicers: space.servicers.clone(),
                service: space.service,
                start_height: self.height,
                number_of_relays: space.number_of_relays,
                processed_relays: 0,
            },
        );
        Ok(id)
    }

    /// Moves `processed` relays from remaining to processed.
    pub fn serve_session(&mut self, id: SessionId, processed: u64) -> Result<(), StateInvariantError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(StateInvariantError::UnknownSession(id))?;
        if processed > session.number_of_relays {
            return Err(StateInvariantError::RelayOverrun {
                session: id,
                remaining: session.number_of_relays,
                requested: processed,
            });
        }
        session.number_of_relays -= processed;
        session.processed_relays += processed;
        Ok(())
    }

    pub fn remove_session(&mut self, id: SessionId) -> Result<Session, StateInvariantError> {
        self.sessions
            .remove(&id)
            .ok_or(StateInvariantError::UnknownSession(id))
    }

    // -------------------------------------------------------------------------
    // Servicer lifecycle
    // -------------------------------------------------------------------------

    /// Sets (jail) or clears (unjail) a servicer's pause height.
    pub fn set_pause_height(&mut self, id: AgentId, pause_height: Option<BlockHeight>) -> Result<(), StateInvariantError> {
        let servicer = self
            .servicers
            .get_mut(&id)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::servicer(id)))?;
        servicer.pause_height = pause_height;
        Ok(())
    }

    /// Records a jailing slash; a second record at the same height overwrites.
    pub fn record_jail_slash(&mut self, id: AgentId, height: BlockHeight, amount: Upokt) -> Result<(), StateInvariantError> {
        let servicer = self
            .servicers
            .get_mut(&id)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::servicer(id)))?;
        servicer.slashing_from_jailing_history.insert(height, amount);
        Ok(())
    }

    /// Links a servicer to a catalog service on both sides.
    pub fn link_service(&mut self, servicer: AgentId, service: AgentId) -> Result<(), StateInvariantError> {
        let svc = self
            .services
            .get_mut(&service)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::service(service)))?;
        let entry = self
            .servicers
            .get_mut(&servicer)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::servicer(servicer)))?;
        if entry.offers(service) {
            return Err(StateInvariantError::AlreadyLinked { servicer, service });
        }
        entry.services.push(service);
        svc.servicers.insert(servicer);
        Ok(())
    }

    /// Removes the link between a servicer and a service on both sides.
    pub fn unlink_service(&mut self, servicer: AgentId, service: AgentId) -> Result<(), StateInvariantError> {
        let entry = self
            .servicers
            .get_mut(&servicer)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::servicer(servicer)))?;
        entry.services.retain(|s| *s != service);
        entry.revenue_expectations.remove(&service);
        if let Some(svc) = self.services.get_mut(&service) {
            svc.servicers.remove(&servicer);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes any agent kind, scrubbing back-references.
    pub fn remove_agent(&mut self, key: AgentKey) -> Result<(), StateInvariantError> {
        match key.kind {
            AgentKind::Servicer => self.remove_servicer(key.id).map(|_| ()),
            AgentKind::Application => self.remove_application(key.id).map(|_| ()),
            AgentKind::Gateway => self.remove_gateway(key.id).map(|_| ()),
            AgentKind::Service => self.remove_service(key.id).map(|_| ()),
        }
    }

    /// Removes a servicer from services and session memberships.
    ///
    /// A session left without servicers can never be served and is closed.
    pub fn remove_servicer(&mut self, id: AgentId) -> Result<Servicer, StateInvariantError> {
        let servicer = self
            .servicers
            .remove(&id)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::servicer(id)))?;
        for service in self.services.values_mut() {
            service.servicers.remove(&id);
        }
        for session in self.sessions.values_mut() {
            session.servicers.retain(|s| *s != id);
        }
        self.sessions.retain(|_, session| !session.servicers.is_empty());
        Ok(servicer)
    }

    /// Removes a service from the catalog, from every servicer and
    /// application that lists it, and closes the sessions targeting it.
    pub fn remove_service(&mut self, id: AgentId) -> Result<Service, StateInvariantError> {
        let service = self
            .services
            .remove(&id)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::service(id)))?;
        for servicer in self.servicers.values_mut() {
            servicer.services.retain(|s| *s != id);
            servicer.revenue_expectations.remove(&id);
        }
        for application in self.applications.values_mut() {
            application.services.retain(|s| *s != id);
        }
        self.sessions.retain(|_, session| session.service != Some(id));
        Ok(service)
    }

    /// Removes an application, its delegation link and its sessions.
    pub fn remove_application(&mut self, id: AgentId) -> Result<Application, StateInvariantError> {
        self.unlink_delegation(id)?;
        let application = self
            .applications
            .remove(&id)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::application(id)))?;
        self.sessions.retain(|_, session| session.application != id);
        Ok(application)
    }

    /// Removes a gateway; delegators fall back to paying for themselves.
    pub fn remove_gateway(&mut self, id: AgentId) -> Result<Gateway, StateInvariantError> {
        let gateway = self
            .gateways
            .remove(&id)
            .ok_or(StateInvariantError::UnknownAgent(AgentKey::gateway(id)))?;
        for application in &gateway.delegators {
            if let Some(app) = self.applications.get_mut(application) {
                app.delegate = None;
            }
        }
        for session in self.sessions.values_mut() {
            if session.payer == Payer::Gateway(id) {
                session.payer = Payer::Application(session.application);
            }
        }
        self.understaked_gateways.remove(&id);
        Ok(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> (WorldState, AgentId, AgentId, AgentId, AgentId) {
        let mut state = WorldState::new();
        let svc = state.add_service("eth");
        let s = state
            .admit_servicer(|id| Servicer::new(id, "s", 10.0, 100.0, vec![svc], "ABC", 1.0))
            .unwrap();
        let a = state
            .admit_application(|id| Application::new(id, "a", 100.0, 50.0, vec![svc], "ABC", 1))
            .unwrap();
        let g = state
            .admit_gateway(|id| Gateway::new(id, "g", 1000.0, 500.0))
            .unwrap();
        (state, svc, s, a, g)
    }

    #[test]
    fn test_ids_are_per_kind_and_monotonic() {
        let mut state = WorldState::new();
        let a0 = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 0.0)).unwrap();
        let a1 = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 0.0)).unwrap();
        let s0 = state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![], "ABC", 1.0))
            .unwrap();
        assert_eq!((a0, a1, s0), (AgentId(0), AgentId(1), AgentId(0)));

        state.remove_gateway(a1).unwrap();
        let a2 = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 0.0)).unwrap();
        assert_eq!(a2, AgentId(2));
    }

    #[test]
    fn test_admit_links_services() {
        let (state, svc, s, _, _) = world();
        assert!(state.services()[&svc].servicers.contains(&s));
    }

    #[test]
    fn test_admit_rejects_unknown_service_and_negative_balance() {
        let mut state = WorldState::new();
        let err = state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![AgentId(9)], "ABC", 1.0))
            .unwrap_err();
        assert_eq!(err, StateInvariantError::UnknownAgent(AgentKey::service(AgentId(9))));

        let err = state
            .admit_gateway(|id| Gateway::new(id, "", -1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, StateInvariantError::NegativeBalance { .. }));
        assert!(state.gateways().is_empty());
    }

    #[test]
    fn test_negative_balance_rejected_without_mutation() {
        let (mut state, _, _, a, _) = world();
        let key = AgentKey::application(a);
        let before = state.clone();

        let err = state.adjust_holdings(key, -100.5).unwrap_err();
        assert!(matches!(err, StateInvariantError::NegativeBalance { field: "pokt_holdings", .. }));
        assert_eq!(state, before);

        assert_eq!(state.adjust_holdings(key, -100.0), Ok(0.0));
    }

    #[test]
    fn test_non_finite_delta_rejected() {
        let (mut state, _, s, _, _) = world();
        let err = state.adjust_stake(AgentKey::servicer(s), f64::NAN).unwrap_err();
        assert!(matches!(err, StateInvariantError::NonFiniteAmount { .. }));
    }

    #[test]
    fn test_stake_inflow_tracked_for_servicers() {
        let (mut state, _, s, _, _) = world();
        state.adjust_stake(AgentKey::servicer(s), 25.0).unwrap();
        state.adjust_stake(AgentKey::servicer(s), -5.0).unwrap();
        assert_eq!(state.servicer(s).unwrap().staked_pokt_total_inflow, 125.0);
    }

    #[test]
    fn test_burn_moves_to_ledger() {
        let (mut state, _, _, _, g) = world();
        let supply = state.circulating_supply();
        state.burn_stake(AgentKey::gateway(g), 200.0).unwrap();

        assert_eq!(state.gateway(g).unwrap().staked_pokt, 300.0);
        assert_eq!(state.ledger().burned, 200.0);
        assert_eq!(state.circulating_supply(), supply - 200.0);
        assert!(state.burn_stake(AgentKey::gateway(g), 301.0).is_err());
    }

    #[test]
    fn test_delegation_links_both_sides() {
        let (mut state, _, _, a, g) = world();
        state.link_delegation(a, g).unwrap();
        assert_eq!(state.application(a).unwrap().delegate, Some(g));
        assert!(state.gateway(g).unwrap().delegators.contains(&a));

        assert_eq!(state.unlink_delegation(a), Ok(Some(g)));
        assert!(state.gateway(g).unwrap().delegators.is_empty());
        assert_eq!(state.unlink_delegation(a), Ok(None));
    }

    #[test]
    fn test_session_lifecycle() {
        let (mut state, svc, s, a, _) = world();
        let id = state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Application(a),
                servicers: vec![s],
                service: Some(svc),
                number_of_relays: 10,
            })
            .unwrap();
        assert_eq!(state.latest_session().map(|x| x.id), Some(id));

        state.serve_session(id, 4).unwrap();
        let session = state.session(id).unwrap();
        assert_eq!((session.number_of_relays, session.processed_relays), (6, 4));

        assert!(matches!(
            state.serve_session(id, 7),
            Err(StateInvariantError::RelayOverrun { remaining: 6, requested: 7, .. })
        ));

        state.remove_session(id).unwrap();
        assert_eq!(state.remove_session(id), Err(StateInvariantError::UnknownSession(id)));
    }

    #[test]
    fn test_remove_servicer_scrubs_references() {
        let (mut state, svc, s, a, _) = world();
        let id = state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Application(a),
                servicers: vec![s],
                service: Some(svc),
                number_of_relays: 1,
            })
            .unwrap();

        state.remove_servicer(s).unwrap();
        assert!(state.services()[&svc].servicers.is_empty());
        assert!(state.session(id).unwrap().servicers.is_empty());
    }

    #[test]
    fn test_remove_gateway_scrubs_references() {
        let (mut state, svc, s, a, g) = world();
        state.link_delegation(a, g).unwrap();
        state.set_understaked(g, true).unwrap();
        let id = state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Gateway(g),
                servicers: vec![s],
                service: Some(svc),
                number_of_relays: 1,
            })
            .unwrap();

        state.remove_agent(AgentKey::gateway(g)).unwrap();
        assert_eq!(state.application(a).unwrap().delegate, None);
        assert_eq!(state.session(id).unwrap().payer, Payer::Application(a));
        assert!(state.understaked_gateways().is_empty());
    }

    #[test]
    fn test_remove_application_drops_sessions_and_delegation() {
        let (mut state, svc, s, a, g) = world();
        state.link_delegation(a, g).unwrap();
        state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Gateway(g),
                servicers: vec![s],
                service: Some(svc),
                number_of_relays: 1,
            })
            .unwrap();

        state.remove_application(a).unwrap();
        assert!(state.sessions().is_empty());
        assert!(state.gateway(g).unwrap().delegators.is_empty());
        assert!(state.remove_application(a).is_err());
    }

    #[test]
    fn test_jail_history_overwrites_same_height() {
        let (mut state, _, s, _, _) = world();
        state.record_jail_slash(s, 5, 1.0).unwrap();
        state.record_jail_slash(s, 5, 2.0).unwrap();

        let history = &state.servicer(s).unwrap().slashing_from_jailing_history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[&5], 2.0);
    }

    #[test]
    fn test_rejected_admission_keeps_id() {
        let mut state = WorldState::new();
        assert!(state.admit_gateway(|id| Gateway::new(id, "", -1.0, 0.0)).is_err());
        assert!(state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![AgentId(4)], "ABC", 1.0))
            .is_err());
        assert!(state
            .admit_application(|id| Application::new(id, "", f64::NAN, 0.0, vec![], "ABC", 1))
            .is_err());

        let g = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 0.0)).unwrap();
        let s = state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![], "ABC", 1.0))
            .unwrap();
        let a = state
            .admit_application(|id| Application::new(id, "", 0.0, 0.0, vec![], "ABC", 1))
            .unwrap();
        assert_eq!((g, s, a), (AgentId(0), AgentId(0), AgentId(0)));
    }

    #[test]
    fn test_servicer_records_join_height() {
        let mut state = WorldState::new();
        state.advance_height();
        state.advance_height();
        let s = state
            .admit_servicer(|id| Servicer::new(id, "", 0.0, 0.0, vec![], "ABC", 1.0))
            .unwrap();
        assert_eq!(state.servicer(s).unwrap().join_height, 2);
    }

    #[test]
    fn test_removing_last_servicer_closes_session() {
        let (mut state, svc, s, a, _) = world();
        let other = state
            .admit_servicer(|id| Servicer::new(id, "t", 0.0, 100.0, vec![svc], "ABC", 1.0))
            .unwrap();
        let shared = state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Application(a),
                servicers: vec![s, other],
                service: Some(svc),
                number_of_relays: 10,
            })
            .unwrap();
        let solo = state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Application(a),
                servicers: vec![s],
                service: Some(svc),
                number_of_relays: 10,
            })
            .unwrap();

        state.remove_servicer(s).unwrap();
        assert!(state.session(solo).is_none());
        assert_eq!(state.session(shared).unwrap().servicers, vec![other]);
    }

    #[test]
    fn test_link_service_both_sides() {
        let (mut state, svc, s, _, _) = world();
        let sol = state.add_service("sol");
        state.link_service(s, sol).unwrap();
        assert_eq!(state.servicer(s).unwrap().services, vec![svc, sol]);
        assert!(state.services()[&sol].servicers.contains(&s));

        assert_eq!(
            state.link_service(s, sol),
            Err(StateInvariantError::AlreadyLinked { servicer: s, service: sol })
        );
        assert!(state.link_service(s, AgentId(9)).is_err());
    }

    #[test]
    fn test_remove_service_scrubs_references() {
        let (mut state, svc, s, a, _) = world();
        state.credit_servicer_revenue(s, Some(svc), 5.0, 0.9).unwrap();
        state
            .create_session(&NewSessionSpace {
                application: a,
                payer: Payer::Application(a),
                servicers: vec![s],
                service: Some(svc),
                number_of_relays: 3,
            })
            .unwrap();

        state.remove_agent(AgentKey::service(svc)).unwrap();
        assert!(state.services().is_empty());
        let servicer = state.servicer(s).unwrap();
        assert!(servicer.services.is_empty());
        assert!(servicer.revenue_expectations.is_empty());
        assert!(state.application(a).unwrap().services.is_empty());
        assert!(state.sessions().is_empty());
    }

    #[test]
    fn test_unlink_service_both_sides() {
        let (mut state, svc, s, _, _) = world();
        state.unlink_service(s, svc).unwrap();
        assert!(state.servicer(s).unwrap().services.is_empty());
        assert!(state.services()[&svc].servicers.is_empty());
    }
}
