//! Error taxonomy for the simulation core.
//!
//! A halted pipeline is not an error: stages express "nothing to do" through
//! `Stage::Skipped`. These types cover the two genuine failure modes.

use pokt_env::{AgentId, AgentKey, SessionId, Upokt};
use thiserror::Error;

/// Setup mistakes detected while loading the parameter set.
///
/// Always fatal: no trial is meaningful until the configuration is fixed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A `<action>_function` discriminator names an unimplemented variant
    #[error("Invalid {key}: no variant named {value:?}")]
    UnknownFunction { key: &'static str, value: String },

    /// A parameter value is outside its admissible range
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// No built-in parameter table or experiment carries this name
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// The parameter document could not be parsed
    #[error("Malformed parameter document: {0}")]
    Malformed(String),
}

impl ConfigurationError {
    /// Creates an invalid-value error.
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}

/// A mechanism was asked to produce a state that violates an invariant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateInvariantError {
    /// Applying the delta would leave a balance below zero
    #[error("{field} of {agent} would become negative: {balance} + {delta}")]
    NegativeBalance {
        agent: AgentKey,
        field: &'static str,
        balance: Upokt,
        delta: Upokt,
    },

    /// An amount that can only ever grow was given a negative increment
    #[error("Negative {field} amount: {amount}")]
    NegativeAmount { field: &'static str, amount: Upokt },

    /// Delta is NaN or infinite
    #[error("Non-finite delta {delta} for {agent}")]
    NonFiniteAmount { agent: AgentKey, delta: Upokt },

    /// The referenced agent is not (or no longer) part of the world
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentKey),

    /// The referenced session is not (or no longer) active
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    /// The servicer already offers the service
    #[error("servicer#{servicer} already links service#{service}")]
    AlreadyLinked { servicer: AgentId, service: AgentId },

    /// More relays marked processed than the session has remaining
    #[error("{session} has {remaining} relays remaining, cannot process {requested}")]
    RelayOverrun {
        session: SessionId,
        remaining: u64,
        requested: u64,
    },
}
