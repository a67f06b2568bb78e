//! Space contracts: the typed payloads one pipeline stage hands the next.
//!
//! Spaces carry no behavior. A boundary action produces the first space of
//! a chain, policies derive exact deltas from it, and mechanisms consume
//! those deltas. Every stage result is wrapped in `Stage`, so "nothing to do"
//! is an explicit variant instead of an empty payload.

use crate::session::Payer;
use pokt_env::{AgentId, AgentKey, BlockHeight, SessionId, Upokt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STAGE RESULT
// =============================================================================

/// Outcome of a boundary action or policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage<T> {
    /// The stage produced a payload; the chain continues
    Fired(T),

    /// The stage decided the action is a no-op; the chain halts
    Skipped,
}

impl<T> Stage<T> {
    pub fn is_fired(&self) -> bool {
        matches!(self, Stage::Fired(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Stage::Skipped)
    }

    /// Transforms the payload of a fired stage.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Stage<U> {
        match self {
            Stage::Fired(payload) => Stage::Fired(f(payload)),
            Stage::Skipped => Stage::Skipped,
        }
    }

    /// Runs the next stage only if this one fired.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Stage<U>) -> Stage<U> {
        match self {
            Stage::Fired(payload) => f(payload),
            Stage::Skipped => Stage::Skipped,
        }
    }

    /// Returns the payload, if any.
    pub fn fired(self) -> Option<T> {
        match self {
            Stage::Fired(payload) => Some(payload),
            Stage::Skipped => None,
        }
    }
}

impl<T> From<Option<T>> for Stage<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(payload) => Stage::Fired(payload),
            None => Stage::Skipped,
        }
    }
}

// =============================================================================
// JOIN
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationJoinSpace {
    pub name: String,

    /// Escrow deposited on joining
    pub stake_amount: Upokt,

    pub geo_zone: String,

    /// Servicers requested per session
    pub number_servicers: usize,

    /// Unstaked POKT the application personally holds
    pub personal_holdings: Upokt,

    pub services: Vec<AgentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicerJoinSpace {
    pub name: String,
    pub stake_amount: Upokt,
    pub personal_holdings: Upokt,
    pub geo_zone: String,
    pub services: Vec<AgentId>,
    pub qos: f64,
    pub service_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayJoinSpace {
    pub name: String,
    pub stake_amount: Upokt,
    pub personal_holdings: Upokt,
}

/// A service added to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceJoinSpace {
    pub name: String,
}

// =============================================================================
// DELEGATION
// =============================================================================

/// An application/gateway pair to link or unlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSpace {
    pub application: AgentId,
    pub gateway: AgentId,
}

// =============================================================================
// BALANCES
// =============================================================================

/// A proposed stake top-up, before feasibility is re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakeSpace {
    pub public_key: AgentKey,
    pub stake_amount: Upokt,
}

/// A signed delta to one balance of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifyBalanceSpace {
    pub public_key: AgentKey,
    pub amount: Upokt,
}

/// Holdings debit and stake credit of the same size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakeTransferSpaces {
    pub holdings: ModifyBalanceSpace,
    pub stake: ModifyBalanceSpace,
}

/// Stake removed from circulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnSpace {
    pub public_key: AgentKey,
    pub amount: Upokt,
}

// =============================================================================
// RELAYS
// =============================================================================

/// An application asking for relays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubmitRelayRequestSpace {
    pub application: AgentId,
    pub number_of_requests: u64,
    pub number_of_servicers: usize,
}

/// A fully resolved session to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSessionSpace {
    pub application: AgentId,
    pub payer: Payer,
    pub servicers: Vec<AgentId>,
    pub service: Option<AgentId>,
    pub number_of_relays: u64,
}

/// Output of the session admission policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAdmissionSpaces {
    pub session: NewSessionSpace,

    /// Open sessions of the same application the new one replaces
    pub superseded: Vec<SessionId>,

    /// Per-session burn charged to the payer
    pub burn: Option<BurnSpace>,
}

/// The session the serving leg acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequestSpace {
    pub session: SessionId,
}

/// Revenue owed to one servicer for the relays it served.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServicerPaymentSpace {
    pub servicer: AgentId,
    pub service: Option<AgentId>,
    pub relays: u64,
    pub amount: Upokt,
}

/// Protocol share of a relay payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ProtocolFeeSpace {
    pub dao: Upokt,
    pub block_proposer: Upokt,
}

/// Relays marked served against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeSessionSpace {
    pub session: SessionId,
    pub processed_relays: u64,
}

/// Output of the relay serving policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayServingSpaces {
    /// Debit of the payer's stake (negative amount)
    pub payment: ModifyBalanceSpace,

    /// Who pays; selects the balance mechanism
    pub payer: Payer,

    pub payouts: Vec<ServicerPaymentSpace>,
    pub fees: ProtocolFeeSpace,

    /// Per-relay burn charged to the payer
    pub burn: Option<BurnSpace>,

    pub serve: ServeSessionSpace,

    /// Set when the session is exhausted or can make no more progress
    pub teardown: Option<SessionId>,
}

// =============================================================================
// JAILING
// =============================================================================

/// A servicer selected for jailing or unjailing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JailSpace {
    pub servicer: AgentId,
}

/// New pause height of a servicer (`None` = released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseHeightSpace {
    pub servicer: AgentId,
    pub pause_height: Option<BlockHeight>,
}

/// Stake forfeited on jailing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlashSpace {
    pub servicer: AgentId,
    pub height: BlockHeight,
    pub amount: Upokt,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JailSpaces {
    pub pause: PauseHeightSpace,
    pub slash: SlashSpace,
}

// =============================================================================
// LEAVING
// =============================================================================

/// Per-agent leave decisions drawn by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LeaveSpace {
    pub decisions: BTreeMap<AgentId, bool>,
}

impl LeaveSpace {
    /// Agents flagged to leave, in id order.
    pub fn leaving(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.decisions
            .iter()
            .filter(|(_, leaves)| **leaves)
            .map(|(id, _)| *id)
    }
}

/// A servicer taking on one more service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkServiceSpace {
    pub servicer: AgentId,
    pub service: AgentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkServiceSpace {
    pub servicer: AgentId,
    pub service: AgentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveAgentSpace {
    pub public_key: AgentKey,
}

/// Servicer departures: unlink every service first, then remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServicerLeaveSpaces {
    pub unlinks: Vec<UnlinkServiceSpace>,
    pub removals: Vec<RemoveAgentSpace>,
}

/// Service departures: every linked servicer drops the service, then the
/// catalog entry is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceLeaveSpaces {
    pub unlinks: Vec<UnlinkServiceSpace>,
    pub removals: Vec<RemoveAgentSpace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_short_circuits() {
        let mut called = false;
        let out: Stage<u32> = Stage::<u32>::Skipped.and_then(|x| {
            called = true;
            Stage::Fired(x + 1)
        });
        assert!(out.is_skipped());
        assert!(!called);

        assert_eq!(Stage::Fired(1).and_then(|x| Stage::Fired(x + 1)), Stage::Fired(2));
    }

    #[test]
    fn test_stage_from_option() {
        assert_eq!(Stage::from(Some(3)), Stage::Fired(3));
        assert_eq!(Stage::<u8>::from(None), Stage::Skipped);
        assert_eq!(Stage::Fired(2).map(|x| x * 5).fired(), Some(10));
    }

    #[test]
    fn test_leave_space_lists_flagged() {
        let mut space = LeaveSpace::default();
        space.decisions.insert(AgentId(2), true);
        space.decisions.insert(AgentId(0), false);
        space.decisions.insert(AgentId(1), true);

        let leaving: Vec<AgentId> = space.leaving().collect();
        assert_eq!(leaving, vec![AgentId(1), AgentId(2)]);
    }
}
