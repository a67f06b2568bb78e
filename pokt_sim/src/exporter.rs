//! JSON exporter for trial time series.
//!
//! Exports one record per block so runs can be analysed offline.

use crate::action_chains::{FanOutCounts, RelaySummary};
use crate::error::SimError;
use pokt_core::WorldState;
use pokt_env::{BlockHeight, Upokt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Population counts at the end of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub servicers: usize,
    pub jailed_servicers: usize,
    pub applications: usize,
    pub delegated_applications: usize,
    pub gateways: usize,
    pub understaked_gateways: usize,
    pub services: usize,
    pub open_sessions: usize,
}

impl Population {
    pub fn observe(state: &WorldState) -> Self {
        Self {
            servicers: state.servicers().len(),
            jailed_servicers: state.servicers().values().filter(|s| s.is_jailed()).count(),
            applications: state.applications().len(),
            delegated_applications: state.applications().values().filter(|a| a.is_delegated()).count(),
            gateways: state.gateways().len(),
            understaked_gateways: state.understaked_gateways().len(),
            services: state.services().len(),
            open_sessions: state.sessions().len(),
        }
    }
}

/// Chain activity during a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockActivity {
    pub joins: usize,
    pub links: FanOutCounts,
    pub delegations: FanOutCounts,
    pub undelegations: FanOutCounts,
    pub stakes: FanOutCounts,
    pub jailed: FanOutCounts,
    pub unjailed: FanOutCounts,
    pub unlinks: FanOutCounts,
    pub leaves: FanOutCounts,
}

/// A single block of simulation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub height: BlockHeight,
    pub population: Population,
    pub activity: BlockActivity,
    pub relays: RelaySummary,

    /// Cumulative DAO plus proposer fees
    pub protocol_fees: Upokt,

    /// Cumulative POKT removed from circulation
    pub burned: Upokt,

    pub circulating_supply: Upokt,
}

impl StepRecord {
    /// Snapshots the state at the end of a block.
    pub fn observe(state: &WorldState, activity: BlockActivity, relays: RelaySummary) -> Self {
        let ledger = state.ledger();
        Self {
            height: state.height(),
            population: Population::observe(state),
            activity,
            relays,
            protocol_fees: ledger.protocol_fees(),
            burned: ledger.burned,
            circulating_supply: state.circulating_supply(),
        }
    }
}

/// Complete trial export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialExport {
    /// Experiment name
    pub experiment: String,

    pub run: usize,

    /// Seed used
    pub seed: u64,

    /// Blocks executed
    pub blocks: u64,

    /// All block records
    pub records: Vec<StepRecord>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TrialExport {
    /// Creates a new export container.
    pub fn new(experiment: &str, run: usize, seed: u64) -> Self {
        Self {
            experiment: experiment.to_string(),
            run,
            seed,
            blocks: 0,
            records: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    pub fn add_record(&mut self, record: StepRecord) {
        self.blocks = record.height;
        self.records.push(record);
    }

    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Total relays requested and processed over the trial.
    pub fn relay_totals(&self) -> RelaySummary {
        self.records.iter().fold(RelaySummary::default(), |acc, r| RelaySummary {
            total_relays: acc.total_relays + r.relays.total_relays,
            processed_relays: acc.processed_relays + r.relays.processed_relays,
        })
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Writes several trial exports as one JSON array.
pub fn write_exports(exports: &[TrialExport], path: &str) -> Result<(), SimError> {
    let json = serde_json::to_string_pretty(exports)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokt_core::{Application, Gateway};

    #[test]
    fn test_export_accumulates_records() {
        let mut state = WorldState::new();
        let a = state
            .admit_application(|id| Application::new(id, "", 1.0, 2.0, vec![], "ABC", 1))
            .unwrap();
        let g = state.admit_gateway(|id| Gateway::new(id, "", 0.0, 3.0)).unwrap();
        state.link_delegation(a, g).unwrap();

        let mut export = TrialExport::new("test1", 0, 42);
        for relays in [5, 7] {
            state.advance_height();
            let summary = RelaySummary {
                total_relays: relays,
                processed_relays: relays - 1,
            };
            export.add_record(StepRecord::observe(&state, BlockActivity::default(), summary));
        }
        export.finalize(true, None);

        assert_eq!(export.blocks, 2);
        assert_eq!(export.relay_totals(), RelaySummary { total_relays: 12, processed_relays: 10 });
        let last = &export.records[1];
        assert_eq!(last.population.delegated_applications, 1);
        assert_eq!(last.circulating_supply, 6.0);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["records"][0]["height"], 1);
        assert!(json.get("failure_reason").is_none());
    }
}
