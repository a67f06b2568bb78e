//! POKT Simulation Environment Layer
//!
//! This crate isolates the two things every pipeline stage needs from the
//! outside world but must not own itself:
//! - **Randomness**: uniform draws, choices and Gamma-distributed magnitudes
//! - **Identity**: typed agent identifiers and the units they trade in
//!
//! Boundary actions only ever see the `RandomnessService` trait, so the same
//! stage code runs against a seeded stream in simulation, OS entropy in ad-hoc
//! runs, and a scripted stream in tests.
//!
//! # Example
//!
//! ```ignore
//! use pokt_env::RandomnessService;
//!
//! fn fires(rng: &mut dyn RandomnessService, count: usize, max: usize) -> bool {
//!     rng.uniform() > count as f64 / max as f64
//! }
//! ```

mod randomness;
mod types;
mod error;
mod thread_impl;
mod scripted;

pub use randomness::RandomnessService;
pub use types::{AgentId, AgentKey, AgentKind, BlockHeight, SessionId, Upokt};
pub use error::EnvError;
pub use thread_impl::ThreadRandomness;
pub use scripted::ScriptedRandomness;
