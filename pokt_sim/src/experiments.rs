//! Named experimental setups.

use crate::error::SimError;
use crate::genesis::GenesisConfig;
use pokt_core::ParamSet;

/// Experiment identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentId {
    /// Test state and parameters; quick smoke run
    Test1,

    /// Baseline state and parameters
    Base,
}

impl ExperimentId {
    /// Returns a list of all experiments.
    pub fn all() -> Vec<ExperimentId> {
        vec![ExperimentId::Test1, ExperimentId::Base]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExperimentId::Test1 => "test1",
            ExperimentId::Base => "base",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExperimentId::Test1 => "Small network, low relay volume, one year of blocks",
            ExperimentId::Base => "Baseline calibration, one year of blocks",
        }
    }

    /// Returns the setup this experiment runs with.
    pub fn setup(&self) -> ExperimentSetup {
        match self {
            ExperimentId::Test1 => ExperimentSetup {
                experiment: *self,
                state_preset: "test",
                params_preset: "test",
                monte_carlo_runs: 1,
                blocks: 365,
            },
            ExperimentId::Base => ExperimentSetup {
                experiment: *self,
                state_preset: "base",
                params_preset: "base",
                monte_carlo_runs: 1,
                blocks: 365,
            },
        }
    }
}

impl std::fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ExperimentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test1" | "test" => Ok(ExperimentId::Test1),
            "base" => Ok(ExperimentId::Base),
            _ => Err(format!("Unknown experiment: {}", s)),
        }
    }
}

/// What a trial runner needs to execute an experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentSetup {
    pub experiment: ExperimentId,

    /// Genesis preset name
    pub state_preset: &'static str,

    /// Parameter preset name
    pub params_preset: &'static str,

    /// Independent Monte Carlo runs
    pub monte_carlo_runs: usize,

    /// Blocks per run
    pub blocks: u64,
}

impl ExperimentSetup {
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.monte_carlo_runs = runs;
        self
    }

    pub fn with_blocks(mut self, blocks: u64) -> Self {
        self.blocks = blocks;
        self
    }

    /// Loads the preset parameter set.
    pub fn params(&self) -> Result<ParamSet, SimError> {
        Ok(ParamSet::preset(self.params_preset)?)
    }

    /// Loads the preset genesis configuration.
    pub fn genesis(&self) -> Result<GenesisConfig, SimError> {
        Ok(GenesisConfig::preset(self.state_preset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("test1".parse::<ExperimentId>(), Ok(ExperimentId::Test1));
        assert_eq!("BASE".parse::<ExperimentId>(), Ok(ExperimentId::Base));
        assert!("sweep_1".parse::<ExperimentId>().is_err());
    }

    #[test]
    fn test_setups_resolve() {
        for id in ExperimentId::all() {
            let setup = id.setup();
            assert_eq!(setup.blocks, 365);
            assert_eq!(setup.monte_carlo_runs, 1);
            assert!(setup.params().is_ok());
            assert!(setup.genesis().is_ok());
        }
        let setup = ExperimentId::Base.setup().with_runs(4).with_blocks(10);
        assert_eq!((setup.monte_carlo_runs, setup.blocks), (4, 10));
    }
}
