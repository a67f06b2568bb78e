//! POKT Economic Simulation Harness
//!
//! This crate runs the transition pipeline of a POKT relay network block by
//! block, every trial reproducible from a single 64-bit seed.
//!
//! # Core Principle: Boundary Action → Policy → Mechanism
//!
//! Every state change flows through the same three stages:
//! - **Boundary actions** draw randomness and propose what should happen
//! - **Policies** validate proposals and compute exact deltas
//! - **Mechanisms** commit those deltas through `WorldState`'s mutation methods
//!
//! Action chains wire the stages together and halt on the first
//! `Stage::Skipped`, so a vetoed action never mutates anything.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TrialRunner                           │
//! │   run 0 ─┐   run 1 ─┐   ...          (rayon, one per run)   │
//! │  ┌───────▼──────────▼─────────────────────────────────┐     │
//! │  │ SimWorld: WorldState + ParamSet + SimContext(seed) │     │
//! │  └───────┬────────────────────────────────────────────┘     │
//! │          │ step(): joins → delegation → stakes → relays     │
//! │          │         → jailing → leaves                       │
//! │  ┌───────▼────────┐   ┌──────────┐   ┌────────────┐         │
//! │  │ Boundary action├──►│  Policy  ├──►│ Mechanism  │         │
//! │  └────────────────┘   └──────────┘   └────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pokt_sim::{ExperimentId, TrialRunner};
//!
//! let setup = ExperimentId::Test1.setup().with_blocks(100);
//! let results = TrialRunner::new(&setup, 42)?.run();
//! assert!(results.iter().all(|r| r.passed));
//! ```

pub mod action_chains;
pub mod boundary_actions;
mod context;
mod error;
pub mod experiments;
pub mod exporter;
pub mod genesis;
pub mod mechanisms;
pub mod policy;
mod runner;
mod world;

pub use action_chains::{ChainOutcome, FanOutReport, RelaySummary};
pub use context::SimContext;
pub use error::SimError;
pub use experiments::{ExperimentId, ExperimentSetup};
pub use exporter::{StepRecord, TrialExport};
pub use genesis::GenesisConfig;
pub use runner::{TrialMetrics, TrialResult, TrialRunner};
pub use world::SimWorld;
