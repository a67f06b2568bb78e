//! Action Chains: wire Boundary Action → Policy → Mechanism for one action.
//!
//! A chain runs its stages in strict order and halts on the first
//! `Stage::Skipped`; a halted chain has mutated nothing. Single-shot chains
//! (joins, the relay chain) propagate a mechanism failure to the caller.
//! Fan-out chains (stake, delegation, leave, linking, jailing) process every element
//! independently: an element that fails is logged, reported in the
//! `FanOutReport`, and does not stop the rest.

mod application;
mod gateway;
mod relay;
mod service;
mod servicer;

pub use application::{
    application_join_ac, application_leave_ac, application_stake_ac, gateway_delegation_ac,
    gateway_undelegation_ac,
};
pub use gateway::{gateway_join_ac, gateway_leave_ac, gateway_stake_ac};
pub use relay::{relay_requests_ac, RelaySummary};
pub use service::{service_join_ac, service_leave_ac, service_linking_ac, service_unlinking_ac};
pub use servicer::{jailing_slashing_ac, servicer_join_ac, servicer_leave_ac, servicer_stake_ac, JailingReport};

use crate::error::SimError;
use pokt_env::AgentKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result of a single-shot chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome<T = ()> {
    /// Every stage fired and the mechanisms committed
    Applied(T),

    /// A stage decided the action is a no-op; nothing was mutated
    Skipped,
}

impl<T> ChainOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, ChainOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            ChainOutcome::Applied(value) => Some(value),
            ChainOutcome::Skipped => None,
        }
    }
}

/// An element of a fan-out chain whose mechanism refused to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFailure {
    pub agent: AgentKey,
    pub error: SimError,
}

/// Per-element tally of a fan-out chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanOutReport {
    /// Elements whose mechanisms committed
    pub applied: usize,

    /// Elements vetoed by the policy
    pub skipped: usize,

    /// Elements whose mechanisms failed
    pub failed: Vec<ElementFailure>,
}

impl FanOutReport {
    /// Records the outcome of one element, logging failures.
    pub(crate) fn record<T>(&mut self, chain: &str, agent: AgentKey, result: Result<ChainOutcome<T>, SimError>) {
        match result {
            Ok(ChainOutcome::Applied(_)) => self.applied += 1,
            Ok(ChainOutcome::Skipped) => self.skipped += 1,
            Err(error) => {
                warn!("{}: {} failed: {}", chain, agent, error);
                self.failed.push(ElementFailure { agent, error });
            }
        }
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: FanOutReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }

    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compact per-block view of a fan-out report for export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutCounts {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl From<&FanOutReport> for FanOutCounts {
    fn from(report: &FanOutReport) -> Self {
        Self {
            applied: report.applied,
            skipped: report.skipped,
            failed: report.failed.len(),
        }
    }
}
