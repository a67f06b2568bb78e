//! Common types for the simulation environment.

use serde::{Deserialize, Serialize};

/// Amount of micro-POKT. Protocol parameters mix integral stakes with
/// fractional per-relay prices, so balances are carried as floats.
pub type Upokt = f64;

/// Block height (the simulation's unit of time).
pub type BlockHeight = u64;

/// Identifier of an agent, unique within its kind for one trial.
///
/// Allocated monotonically by the world state; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    /// True for odd identifier numbers.
    pub fn is_odd(&self) -> bool {
        self.0 % 2 == 1
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role an agent plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Servicer,
    Application,
    Gateway,
    Service,
}

impl AgentKind {
    /// Returns the lowercase role name.
    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Servicer => "servicer",
            AgentKind::Application => "application",
            AgentKind::Gateway => "gateway",
            AgentKind::Service => "service",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An agent's identity token (its "public key").
///
/// Identifiers are only unique per kind, so the key carries both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentKey {
    pub kind: AgentKind,
    pub id: AgentId,
}

impl AgentKey {
    pub fn servicer(id: AgentId) -> Self {
        Self { kind: AgentKind::Servicer, id }
    }

    pub fn application(id: AgentId) -> Self {
        Self { kind: AgentKind::Application, id }
    }

    pub fn gateway(id: AgentId) -> Self {
        Self { kind: AgentKind::Gateway, id }
    }

    pub fn service(id: AgentId) -> Self {
        Self { kind: AgentKind::Service, id }
    }
}

impl std::fmt::Display for AgentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Identifier of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_key_display() {
        assert_eq!(AgentKey::gateway(AgentId(7)).to_string(), "gateway#7");
        assert_eq!(SessionId(3).to_string(), "session#3");
    }

    #[test]
    fn test_keys_distinguish_kinds() {
        let a = AgentKey::application(AgentId(1));
        let g = AgentKey::gateway(AgentId(1));
        assert_ne!(a, g);
    }

    #[test]
    fn test_odd_ids() {
        assert!(AgentId(1).is_odd());
        assert!(!AgentId(0).is_odd());
    }
}
