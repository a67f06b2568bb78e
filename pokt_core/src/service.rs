//! Service: a blockchain/API that servicers link and applications consume.

use pokt_env::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: AgentId,
    pub name: String,

    /// Servicers linked to this service
    pub servicers: BTreeSet<AgentId>,
}

impl Service {
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            servicers: BTreeSet::new(),
        }
    }
}
