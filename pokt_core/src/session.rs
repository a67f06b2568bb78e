//! Relay sessions binding an application to a set of servicers.

use pokt_env::{AgentId, AgentKey, BlockHeight, SessionId};
use serde::{Deserialize, Serialize};

/// Who pays for the relays of a session.
///
/// Carried explicitly so balance adjustments dispatch on a `match` rather
/// than on the runtime type of the paying agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Payer {
    Application(AgentId),
    Gateway(AgentId),
}

impl Payer {
    /// The paying agent's identity token.
    pub fn key(&self) -> AgentKey {
        match self {
            Payer::Application(id) => AgentKey::application(*id),
            Payer::Gateway(id) => AgentKey::gateway(*id),
        }
    }
}

/// An active serving window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// Application requesting relays
    pub application: AgentId,

    /// Agent whose stake pays for the relays
    pub payer: Payer,

    /// Servicers assigned to the session
    pub servicers: Vec<AgentId>,

    /// Service the relays target, if the application declared one
    pub service: Option<AgentId>,

    /// Height at which the session was created
    pub start_height: BlockHeight,

    /// Relays still to be served
    pub number_of_relays: u64,

    /// Relays served so far
    pub processed_relays: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payer_keys() {
        assert_eq!(Payer::Gateway(AgentId(2)).key(), AgentKey::gateway(AgentId(2)));
        assert_eq!(
            Payer::Application(AgentId(2)).key(),
            AgentKey::application(AgentId(2))
        );
    }

    #[test]
    fn test_payer_serializes_tagged() {
        let json = serde_json::to_string(&Payer::Gateway(AgentId(4))).unwrap();
        assert_eq!(json, r#"{"kind":"gateway","id":4}"#);
    }
}
