//! Trial runner - executes the Monte Carlo runs of an experiment.

use crate::context::SimContext;
use crate::error::SimError;
use crate::experiments::ExperimentSetup;
use crate::exporter::TrialExport;
use crate::genesis::GenesisConfig;
use crate::world::SimWorld;
use pokt_core::ParamSet;
use pokt_env::ThreadRandomness;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Results from running one trial.
#[derive(Debug, Clone)]
pub struct TrialResult {
    /// Monte Carlo run index
    pub run: usize,

    /// Seed used
    pub seed: u64,

    /// True if every block executed and every balance stayed non-negative
    pub passed: bool,

    /// Blocks executed
    pub blocks: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during the run
    pub metrics: TrialMetrics,

    /// Per-block records
    pub export: TrialExport,
}

/// Totals collected during a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrialMetrics {
    pub total_relays: u64,
    pub processed_relays: u64,

    /// Fan-out elements whose mechanism refused to commit
    pub element_failures: usize,

    pub final_supply: f64,
    pub burned: f64,
}

/// Runs every trial of an experiment.
pub struct TrialRunner {
    experiment: String,
    params: ParamSet,
    genesis: GenesisConfig,

    /// Master seed; trial seeds derive from it
    seed: u64,

    runs: usize,
    blocks: u64,

    /// Run trials on the rayon pool
    parallel: bool,

    /// Draw from the thread RNG instead of per-trial seeded streams
    unseeded: bool,
}

impl TrialRunner {
    /// Creates a runner for an experiment's presets.
    pub fn new(setup: &ExperimentSetup, seed: u64) -> Result<Self, SimError> {
        Ok(Self {
            experiment: setup.experiment.name().to_string(),
            params: setup.params()?,
            genesis: setup.genesis()?,
            seed,
            runs: setup.monte_carlo_runs,
            blocks: setup.blocks,
            parallel: true,
            unseeded: false,
        })
    }

    /// Replaces the preset parameters.
    pub fn with_params(mut self, params: ParamSet) -> Self {
        self.params = params;
        self
    }

    pub fn with_genesis(mut self, genesis: GenesisConfig) -> Self {
        self.genesis = genesis;
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_blocks(mut self, blocks: u64) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Unseeded trials do not replay; their reported seed is 0.
    pub fn with_unseeded(mut self, unseeded: bool) -> Self {
        self.unseeded = unseeded;
        self
    }

    /// Runs all trials; results come back in run order.
    pub fn run(&self) -> Vec<TrialResult> {
        info!(
            "Starting experiment: {} ({} runs x {} blocks, seed={})",
            self.experiment, self.runs, self.blocks, self.seed
        );

        let mut results: Vec<TrialResult> = if self.parallel && self.runs > 1 {
            (0..self.runs).into_par_iter().map(|run| self.run_trial(run)).collect()
        } else {
            (0..self.runs).map(|run| self.run_trial(run)).collect()
        };
        results.sort_by_key(|r| r.run);
        results
    }

    /// Runs a single trial with its own world and randomness stream.
    pub fn run_trial(&self, run: usize) -> TrialResult {
        let seed = if self.unseeded {
            0
        } else {
            SimContext::trial_seed(self.seed, run)
        };
        let mut export = TrialExport::new(&self.experiment, run, seed);
        let mut metrics = TrialMetrics::default();

        let failure = match SimWorld::new(self.params.clone(), &self.genesis, seed) {
            Ok(mut world) => {
                let failure = self.drive(&mut world, &mut metrics);
                metrics.final_supply = world.state.circulating_supply();
                metrics.burned = world.state.ledger().burned;
                for record in world.into_records() {
                    export.add_record(record);
                }
                failure
            }
            Err(e) => Some(format!("Genesis failed: {}", e)),
        };

        let passed = failure.is_none();
        if let Some(reason) = &failure {
            warn!("Trial {} (seed={}) failed: {}", run, seed, reason);
        } else {
            info!(
                "Trial {} (seed={}) finished: {}/{} relays processed",
                run, seed, metrics.processed_relays, metrics.total_relays
            );
        }
        export.finalize(passed, failure.clone());

        TrialResult {
            run,
            seed,
            passed,
            blocks: export.blocks,
            failure_reason: failure,
            metrics,
            export,
        }
    }

    /// Steps the world, checking balances after every block.
    fn drive(&self, world: &mut SimWorld, metrics: &mut TrialMetrics) -> Option<String> {
        let mut thread_rng = self.unseeded.then(ThreadRandomness::new);
        for _ in 0..self.blocks {
            let block = world.height() + 1;
            let step = match thread_rng.as_mut() {
                Some(rng) => world.step_with(rng),
                None => world.step(),
            };
            let record = match step {
                Ok(record) => record,
                Err(e) => return Some(format!("Block {} aborted: {}", block, e)),
            };
            metrics.total_relays += record.relays.total_relays;
            metrics.processed_relays += record.relays.processed_relays;
            let activity = &record.activity;
            metrics.element_failures += activity.links.failed
                + activity.delegations.failed
                + activity.undelegations.failed
                + activity.stakes.failed
                + activity.jailed.failed
                + activity.unjailed.failed
                + activity.unlinks.failed
                + activity.leaves.failed;

            if let Err(e) = world.state.check_invariants() {
                return Some(format!("Invariant violated at block {}: {}", block, e));
            }
            if block % 100 == 0 {
                debug!(
                    "  block={} | servicers={} | applications={} | gateways={}",
                    block,
                    world.state.servicers().len(),
                    world.state.applications().len(),
                    world.state.gateways().len()
                );
            }
        }
        None
    }
}
