//! SimWorld - one trial's state, parameters and randomness.

use crate::action_chains::{
    application_join_ac, application_leave_ac, application_stake_ac, gateway_delegation_ac,
    gateway_join_ac, gateway_leave_ac, gateway_stake_ac, gateway_undelegation_ac,
    jailing_slashing_ac, relay_requests_ac, service_join_ac, service_leave_ac, service_linking_ac,
    service_unlinking_ac, servicer_join_ac, servicer_leave_ac, servicer_stake_ac, FanOutCounts,
    FanOutReport,
};
use crate::context::SimContext;
use crate::error::SimError;
use crate::exporter::{BlockActivity, StepRecord};
use crate::genesis::GenesisConfig;
use pokt_core::{ParamSet, WorldState};
use pokt_env::{BlockHeight, RandomnessService};
use tracing::debug;

/// The SimWorld - container for a single trial.
pub struct SimWorld {
    /// Validated parameters (read-only for the whole trial)
    pub params: ParamSet,

    /// The evolving network
    pub state: WorldState,

    /// Seeded randomness used by `step` and `run`
    pub context: SimContext,

    /// One record per executed block
    records: Vec<StepRecord>,
}

impl SimWorld {
    /// Creates a world from a genesis configuration.
    pub fn new(params: ParamSet, genesis: &GenesisConfig, seed: u64) -> Result<Self, SimError> {
        let state = genesis.build(&params)?;
        Ok(Self::from_state(params, state, seed))
    }

    /// Wraps an already-built state.
    pub fn from_state(params: ParamSet, state: WorldState, seed: u64) -> Self {
        Self {
            params,
            state,
            context: SimContext::new(seed),
            records: Vec::new(),
        }
    }

    /// Executes one block with the world's seeded randomness.
    pub fn step(&mut self) -> Result<&StepRecord, SimError> {
        let record = transition(&mut self.state, &self.params, &mut self.context)?;
        Ok(self.push(record))
    }

    /// Executes one block drawing from an external randomness source.
    pub fn step_with(&mut self, rng: &mut dyn RandomnessService) -> Result<&StepRecord, SimError> {
        let record = transition(&mut self.state, &self.params, rng)?;
        Ok(self.push(record))
    }

    /// Executes `blocks` blocks, stopping at the first failed block.
    pub fn run(&mut self, blocks: u64) -> Result<(), SimError> {
        for _ in 0..blocks {
            self.step()?;
        }
        Ok(())
    }

    /// Like [`SimWorld::run`] but with an external randomness source.
    pub fn run_with(&mut self, blocks: u64, rng: &mut dyn RandomnessService) -> Result<(), SimError> {
        for _ in 0..blocks {
            self.step_with(rng)?;
        }
        Ok(())
    }

    fn push(&mut self, record: StepRecord) -> &StepRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn height(&self) -> BlockHeight {
        self.state.height()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}

/// Advances the state by one block.
///
/// Order: joins, service linking, delegation, undelegation, stakes, one
/// relay chain, jailing, service unlinking, leaves. Linking runs right
/// after the joins so servicers admitted this block link at their
/// just-joined rate. Fan-out failures are recorded in the block's
/// activity; a single-shot chain failure aborts the block.
fn transition(
    state: &mut WorldState,
    params: &ParamSet,
    rng: &mut dyn RandomnessService,
) -> Result<StepRecord, SimError> {
    let height = state.advance_height();

    let mut joins = 0;
    joins += usize::from(application_join_ac(state, params, rng)?.is_applied());
    joins += usize::from(servicer_join_ac(state, params, rng)?.is_applied());
    joins += usize::from(gateway_join_ac(state, params, rng)?.is_applied());
    joins += usize::from(service_join_ac(state, params, rng)?.is_applied());

    let links = service_linking_ac(state, params, rng);
    let delegations = gateway_delegation_ac(state, params, rng);
    let undelegations = gateway_undelegation_ac(state, params, rng);

    let mut stakes = application_stake_ac(state, params);
    stakes.merge(gateway_stake_ac(state, params)?);
    stakes.merge(servicer_stake_ac(state, params));

    let relays = relay_requests_ac(state, params, rng)?;
    let jailing = jailing_slashing_ac(state, params, rng);
    let unlinks = service_unlinking_ac(state, params, rng);

    let mut leaves = application_leave_ac(state, params, rng);
    leaves.merge(gateway_leave_ac(state, params, rng));
    leaves.merge(servicer_leave_ac(state, params, rng));
    leaves.merge(service_leave_ac(state, params, rng));

    let activity = BlockActivity {
        joins,
        links: counts(&links),
        delegations: counts(&delegations),
        undelegations: counts(&undelegations),
        stakes: counts(&stakes),
        jailed: counts(&jailing.jailed),
        unjailed: counts(&jailing.unjailed),
        unlinks: counts(&unlinks),
        leaves: counts(&leaves),
    };
    debug!(
        "Block {}: {} joins, {} leaves, {}/{} relays",
        height, joins, leaves.applied, relays.processed_relays, relays.total_relays
    );

    Ok(StepRecord::observe(state, activity, relays))
}

fn counts(report: &FanOutReport) -> FanOutCounts {
    FanOutCounts::from(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_env::ThreadRandomness;

    fn test_world(seed: u64) -> SimWorld {
        let params = ParamSet::preset("test").unwrap();
        SimWorld::new(params, &GenesisConfig::test(), seed).unwrap()
    }

    #[test]
    fn test_sim_world_step() {
        let mut world = test_world(42);
        assert_eq!(world.height(), 0);

        let record = world.step().unwrap();
        assert_eq!(record.height, 1);
        assert_eq!(world.height(), 1);
        assert_eq!(world.records().len(), 1);
    }

    #[test]
    fn test_sim_world_determinism() {
        let mut world1 = test_world(7);
        let mut world2 = test_world(7);
        world1.run(30).unwrap();
        world2.run(30).unwrap();

        assert_eq!(world1.records(), world2.records());
        assert_eq!(world1.state, world2.state);
    }

    #[test]
    fn test_step_with_external_randomness() {
        let mut world = test_world(5);
        let mut rng = ThreadRandomness::new();
        world.run_with(10, &mut rng).unwrap();

        assert_eq!(world.height(), 10);
        assert_eq!(world.records().len(), 10);
        assert!(world.state.check_invariants().is_ok());
        // the seeded stream is left untouched
        assert_eq!(world.context.draws(), 0);
    }

    #[test]
    fn test_services_come_and_go() {
        let mut table = pokt_core::params::ParamTable::test();
        table.behavior.service_leave_probability = 0.2;
        table.behavior.service_linking_probability_normal = 0.5;
        table.behavior.service_unlinking_probability = 0.5;
        let params = ParamSet::from_table(table).unwrap();
        let mut world = SimWorld::new(params, &GenesisConfig::test(), 9).unwrap();
        world.run(40).unwrap();

        assert!(world.state.check_invariants().is_ok());
        let links: usize = world.records().iter().map(|r| r.activity.links.applied).sum();
        let unlinks: usize = world.records().iter().map(|r| r.activity.unlinks.applied).sum();
        assert!(links > 0);
        assert!(unlinks > 0);
    }

    #[test]
    fn test_sim_world_keeps_invariants() {
        let mut world = test_world(3);
        world.run(50).unwrap();
        assert!(world.state.check_invariants().is_ok());
        let relays: u64 = world.records().iter().map(|r| r.relays.total_relays).sum();
        assert!(relays > 0);
    }
}
