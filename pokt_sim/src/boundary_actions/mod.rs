//! Boundary Actions: the stochastic decision layer.
//!
//! A boundary action reads the world, draws from the randomness service
//! and proposes what should happen. It never mutates state. Three shapes
//! exist:
//! - **threshold join**: fires iff `uniform() > count / max_count`
//! - **sweep**: one independent decision per agent of a collection
//! - **magnitude**: pick an agent, sample how much (relays per session)

mod application;
mod gateway;
mod service;
mod servicer;

pub use application::{
    application_join_ba, application_leave_ba, application_stake_ba, application_stake_target,
    gateway_delegation_ba, gateway_undelegation_ba, submit_relay_requests_ba,
};
pub use gateway::{gateway_join_ba, gateway_leave_ba, gateway_stake_ba, gateway_stake_target};
pub use service::{service_join_ba, service_leave_ba, service_linking_ba, service_unlinking_ba};
pub use servicer::{
    jailing_ba, relay_requests_ba, servicer_join_ba, servicer_leave_ba, servicer_stake_ba,
    unjailing_ba,
};

use pokt_core::spaces::{LeaveSpace, StakeSpace};
use pokt_core::{ParamSet, Staker};
use pokt_env::{AgentId, RandomnessService, Upokt};

/// Threshold join decision: the fuller the population, the less likely a
/// newcomer. Never fires once `count >= max_count`.
pub fn threshold_join(count: usize, max_count: usize, rng: &mut dyn RandomnessService) -> bool {
    let threshold = count as f64 / max_count as f64;
    rng.uniform() > threshold
}

/// Most services a servicer links, by behavior and by protocol.
pub(crate) fn link_cap(params: &ParamSet) -> usize {
    params
        .behavior
        .service_max_number_link
        .min(params.system.max_chains_servicer)
}

/// Independent Bernoulli leave decision per agent.
pub(crate) fn leave_sweep(
    ids: impl Iterator<Item = AgentId>,
    probability: f64,
    rng: &mut dyn RandomnessService,
) -> LeaveSpace {
    LeaveSpace {
        decisions: ids.map(|id| (id, rng.uniform() < probability)).collect(),
    }
}

/// Stake top-up proposal for one agent, `None` when already at target.
///
/// The amount is `max(min(holdings, target - staked), 0)`.
pub(crate) fn stake_toward(agent: &dyn Staker, target: Upokt) -> Option<StakeSpace> {
    if agent.staked_pokt() >= target {
        return None;
    }
    let amount = agent.pokt_holdings().min(target - agent.staked_pokt()).max(0.0);
    Some(StakeSpace {
        public_key: agent.key(),
        stake_amount: amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::Application;
    use pokt_env::ScriptedRandomness;

    #[test]
    fn test_threshold_join_never_fires_at_cap() {
        let mut rng = ScriptedRandomness::new().with_uniforms([0.999_999]);
        assert!(!threshold_join(5, 5, &mut rng));
    }

    #[test]
    fn test_threshold_join_fires_above_threshold() {
        let mut rng = ScriptedRandomness::new().with_uniforms([0.41, 0.39]);
        assert!(threshold_join(2, 5, &mut rng));
        assert!(!threshold_join(2, 5, &mut rng));
    }

    #[test]
    fn test_stake_toward_clamps_to_holdings() {
        let app = Application::new(AgentId(0), "a", 100.0, 0.0, vec![], "ABC", 1);
        let space = stake_toward(&app, 1_000.0).unwrap();
        assert_eq!(space.stake_amount, 100.0);

        let rich = Application::new(AgentId(1), "b", 5_000.0, 900.0, vec![], "ABC", 1);
        assert_eq!(stake_toward(&rich, 1_000.0).unwrap().stake_amount, 100.0);
        assert!(stake_toward(&rich, 900.0).is_none());
    }
}
