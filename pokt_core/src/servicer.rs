//! Servicer: a node that serves relays for the services it links.

use crate::agent::{impl_staker, StakeStatus};
use pokt_env::{AgentId, AgentKey, BlockHeight, Upokt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A relay-serving node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Servicer {
    /// Unique servicer ID
    pub id: AgentId,

    pub name: String,

    /// Fixed per-period salary (unused by the relay economy, reported only)
    pub servicer_salary: Upokt,

    /// Aggregate quality score from session reports
    pub report_card: f64,

    /// Latest test score
    pub test_scores: f64,

    /// Liquid balance
    pub pokt_holdings: Upokt,

    /// Escrowed balance
    pub staked_pokt: Upokt,

    pub service_url: Option<String>,

    /// Linked services
    pub services: Vec<AgentId>,

    /// Physical geo-location identifier the servicer registered in
    pub geo_zone: String,

    /// Operator that controls this servicer, if distinct from itself
    pub operator_public_key: Option<AgentKey>,

    /// Height at which the servicer was jailed (`None` = not jailed)
    pub pause_height: Option<BlockHeight>,

    pub stake_status: StakeStatus,

    pub unstaking_height: Option<BlockHeight>,

    /// Height at which the servicer was admitted
    pub join_height: BlockHeight,

    /// Quality of service in `[0, 1]`: the fraction of its relay share served
    pub qos: f64,

    /// Exponentially weighted revenue expectation per service
    pub revenue_expectations: BTreeMap<AgentId, Upokt>,

    /// Stake slashed on jailing, keyed by the jailing height
    pub slashing_from_jailing_history: BTreeMap<BlockHeight, Upokt>,

    /// Cumulative stake ever moved into escrow
    pub staked_pokt_total_inflow: Upokt,

    /// Cumulative relay revenue
    pub total_revenues: Upokt,
}

impl_staker!(Servicer, AgentKey::servicer);

impl Servicer {
    /// Creates a staked, unjailed servicer.
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        pokt_holdings: Upokt,
        staked_pokt: Upokt,
        services: Vec<AgentId>,
        geo_zone: impl Into<String>,
        qos: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            servicer_salary: 0.0,
            report_card: 0.0,
            test_scores: 0.0,
            pokt_holdings,
            staked_pokt,
            service_url: None,
            services,
            geo_zone: geo_zone.into(),
            operator_public_key: None,
            pause_height: None,
            stake_status: StakeStatus::Staked,
            unstaking_height: None,
            join_height: 0,
            qos: qos.clamp(0.0, 1.0),
            revenue_expectations: BTreeMap::new(),
            slashing_from_jailing_history: BTreeMap::new(),
            staked_pokt_total_inflow: staked_pokt,
            total_revenues: 0.0,
        }
    }

    /// True while the servicer is paused by jailing.
    pub fn is_jailed(&self) -> bool {
        self.pause_height.is_some()
    }

    /// True during the block the servicer was admitted in.
    pub fn just_joined(&self, height: BlockHeight) -> bool {
        self.join_height == height
    }

    /// True if the servicer links `service`.
    pub fn offers(&self, service: AgentId) -> bool {
        self.services.contains(&service)
    }

    /// Services paired with their revenue expectation, lowest first.
    ///
    /// Ties keep service-id order.
    pub fn services_by_revenue(&self) -> Vec<(AgentId, Upokt)> {
        let mut out: Vec<(AgentId, Upokt)> = self
            .revenue_expectations
            .iter()
            .map(|(service, expected)| (*service, *expected))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1));
        out
    }

    /// Folds a new revenue observation into the service's expectation:
    /// `E' = λ·E + (1 − λ)·revenue`. The first observation seeds `E`.
    pub fn observe_revenue(&mut self, service: AgentId, revenue: Upokt, lambda: f64) {
        let expected = self
            .revenue_expectations
            .entry(service)
            .or_insert(revenue);
        *expected = lambda * *expected + (1.0 - lambda) * revenue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Staker;
    use approx::assert_relative_eq;

    fn servicer() -> Servicer {
        Servicer::new(AgentId(3), "s3", 10.0, 20.0, vec![AgentId(0), AgentId(1)], "ABC", 0.9)
    }

    #[test]
    fn test_servicer_staker_view() {
        let s = servicer();
        assert_eq!(s.key(), AgentKey::servicer(AgentId(3)));
        assert_eq!(s.total_pokt(), 30.0);
        assert_eq!(s.staked_pokt_total_inflow, 20.0);
        assert!(!s.is_jailed());
        assert!(s.offers(AgentId(1)));
        assert!(s.just_joined(0));
        assert!(!s.just_joined(1));
    }

    #[test]
    fn test_qos_is_clamped() {
        let s = Servicer::new(AgentId(0), "", 0.0, 0.0, vec![], "ABC", 1.7);
        assert_eq!(s.qos, 1.0);
    }

    #[test]
    fn test_revenue_expectation_ewm() {
        let mut s = servicer();
        s.observe_revenue(AgentId(0), 100.0, 0.9);
        assert_relative_eq!(s.revenue_expectations[&AgentId(0)], 100.0);

        s.observe_revenue(AgentId(0), 0.0, 0.9);
        assert_relative_eq!(s.revenue_expectations[&AgentId(0)], 90.0);
    }

    #[test]
    fn test_services_by_revenue_ascending() {
        let mut s = servicer();
        s.observe_revenue(AgentId(0), 50.0, 0.5);
        s.observe_revenue(AgentId(1), 10.0, 0.5);

        let ranked = s.services_by_revenue();
        assert_eq!(ranked[0].0, AgentId(1));
        assert_eq!(ranked[1].0, AgentId(0));
    }
}
