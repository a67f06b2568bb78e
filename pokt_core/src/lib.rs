//! POKT Core - Economic State of a Decentralized Relay Network
//!
//! This library holds everything the transition pipeline reads and writes:
//! 1. **Entity model**: servicers, applications, gateways and services
//! 2. **World state**: the single owner of agents, sessions and counters,
//!    exposing narrow mutation methods that enforce balance invariants
//! 3. **Spaces**: typed payloads passed between pipeline stages
//! 4. **Parameters**: protocol constants, behaviors and stage variants,
//!    validated once at load time

pub mod agent;
pub mod application;
pub mod error;
pub mod gateway;
pub mod params;
pub mod service;
pub mod servicer;
pub mod session;
pub mod spaces;
pub mod state;

// Re-export key types for convenience
pub use agent::{StakeStatus, Staker};
pub use application::Application;
pub use error::{ConfigurationError, StateInvariantError};
pub use gateway::Gateway;
pub use params::{ParamSet, ParamTable, Strategies};
pub use service::Service;
pub use servicer::Servicer;
pub use session::{Payer, Session};
pub use spaces::Stage;
pub use state::{ProtocolLedger, WorldState};
