//! Parameter set: protocol constants, behavioral knobs and stage variants.
//!
//! Parameters arrive as one flat mapping (`ParamTable`), the shape external
//! configuration builders produce. Loading resolves it into a `ParamSet`:
//! numeric sections are range-checked and every `<action>_function`
//! discriminator is turned into a `Strategies` entry, so an unknown variant
//! fails at load time instead of at the first step that needs it.

use crate::error::ConfigurationError;
use pokt_env::Upokt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// RAW TABLE
// =============================================================================

/// Protocol-level constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemParams {
    /// Minimum stake for a servicer to join or be unjailed
    pub minimum_stake_servicer: Upokt,

    /// Blocks a jailed servicer must wait before unjailing
    pub minimum_pause_time: u64,

    /// Maximum number of services a servicer may link
    pub max_chains_servicer: usize,

    /// Stake consumed per relay served
    pub relays_to_tokens_multiplier: f64,

    /// Fraction of stake slashed when jailed for downtime
    pub slash_fraction_downtime: f64,

    pub minimum_servicers_per_session: usize,
    pub maximum_servicers_per_session: usize,

    /// Burned from the payer's stake once per created session
    pub app_burn_per_session: Upokt,

    /// Burned from the payer's stake per processed relay
    pub app_burn_per_relay: Upokt,

    /// Share of relay payments kept by the block proposer
    pub block_proposer_allocation: f64,

    /// Share of relay payments kept by the DAO
    pub dao_allocation: f64,

    /// Share of relay payments paid out to servicers
    pub servicer_allocation: f64,

    /// Gateway stake required per delegated application
    pub stake_per_app_delegation: Upokt,

    pub gateway_minimum_stake: Upokt,
}

/// Behavioral knobs driving the boundary actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorParams {
    pub application_max_number: usize,
    pub servicer_max_number: usize,
    pub gateway_max_number: usize,

    /// Catalog size beyond which no new service joins
    pub service_max_number: usize,

    /// Services a servicer links at most
    pub service_max_number_link: usize,

    pub application_leave_probability: f64,
    pub gateway_leave_probability: f64,
    pub servicer_leave_probability: f64,
    pub service_leave_probability: f64,
    pub service_unlinking_probability: f64,
    pub gateway_undelegation_probability: f64,
    pub relays_per_session_gamma_distribution_shape: f64,
    pub relays_per_session_gamma_distribution_scale: f64,
    pub average_session_per_application: f64,
    pub servicer_jailing_probability: f64,
    pub uses_gateway_probability: f64,
    pub applications_use_min_servicers: usize,
    pub applications_use_max_servicers: usize,

    /// Weight of the previous expectation in the revenue EWM
    pub lambda_ewm_revenue_expectation: f64,

    pub service_linking_probability_normal: f64,

    /// Linking probability during the block a servicer joined
    pub service_linking_probability_just_joined: f64,

    /// Chance an unlinking servicer drops its lowest-revenue service
    /// instead of a random one
    pub kick_bottom_probability: f64,
}

/// Stage variant selectors, exactly as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalParams {
    pub application_join_function: String,
    pub servicer_join_function: String,
    pub gateway_join_function: String,
    pub service_join_function: String,
    pub service_linking_function: String,
    pub gateway_delegation_function: String,
    pub gateway_undelegation_function: String,
    pub relay_requests_function: String,
    pub submit_relay_requests_function: String,
    pub submit_relay_requests_policy_function: String,
    pub application_leave_function: String,
    pub servicer_leave_function: String,
    pub gateway_leave_function: String,
    pub service_leave_function: String,
    pub service_unlinking_function: String,
    pub servicer_stake_function: String,
    pub application_stake_function: String,
    pub gateway_stake_function: String,
    pub jailing_function: String,
}

/// The flat parameter mapping as supplied by a configuration builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTable {
    #[serde(flatten)]
    pub system: SystemParams,

    #[serde(flatten)]
    pub behavior: BehaviorParams,

    #[serde(flatten)]
    pub functional: FunctionalParams,
}

impl ParamTable {
    /// Parses a flat JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Malformed(e.to_string()))
    }

    /// Returns a built-in table by name (`"test"` or `"base"`).
    pub fn preset(name: &str) -> Result<Self, ConfigurationError> {
        match name.to_lowercase().as_str() {
            "test" => Ok(Self::test()),
            "base" => Ok(Self::base()),
            _ => Err(ConfigurationError::UnknownPreset(name.to_string())),
        }
    }

    /// Small relay volumes; quick to simulate.
    pub fn test() -> Self {
        let mut table = Self::base();
        table.behavior.service_max_number_link = 8;
        table.behavior.relays_per_session_gamma_distribution_shape = 500.0;
        table.behavior.relays_per_session_gamma_distribution_scale = 50.0;
        table
    }

    /// Baseline calibration.
    pub fn base() -> Self {
        Self {
            system: SystemParams {
                minimum_stake_servicer: 15000.0 * 10e6,
                minimum_pause_time: 10,
                max_chains_servicer: 15,
                relays_to_tokens_multiplier: 161.29,
                slash_fraction_downtime: 0.000001,
                minimum_servicers_per_session: 1,
                maximum_servicers_per_session: 5,
                app_burn_per_session: 0.0,
                app_burn_per_relay: 0.0,
                block_proposer_allocation: 0.05,
                dao_allocation: 0.1,
                servicer_allocation: 0.85,
                stake_per_app_delegation: 15000.0 * 10e6,
                gateway_minimum_stake: 150000.0 * 10e6,
            },
            behavior: BehaviorParams {
                application_max_number: 20,
                servicer_max_number: 20,
                gateway_max_number: 25,
                service_max_number: 10,
                service_max_number_link: 15,
                application_leave_probability: 0.01,
                gateway_leave_probability: 0.01,
                servicer_leave_probability: 0.01,
                service_leave_probability: 0.0025,
                service_unlinking_probability: 0.01,
                gateway_undelegation_probability: 0.01,
                relays_per_session_gamma_distribution_shape: 5.0,
                relays_per_session_gamma_distribution_scale: 300000.0,
                average_session_per_application: 24.0,
                servicer_jailing_probability: 0.001,
                uses_gateway_probability: 0.5,
                applications_use_min_servicers: 1,
                applications_use_max_servicers: 3,
                lambda_ewm_revenue_expectation: 0.9,
                service_linking_probability_normal: 0.01,
                service_linking_probability_just_joined: 0.5,
                kick_bottom_probability: 0.5,
            },
            functional: FunctionalParams {
                application_join_function: "simple_unfiform".to_string(),
                servicer_join_function: "simple_unfiform".to_string(),
                gateway_join_function: "simple_unfiform".to_string(),
                service_join_function: "simple_unfiform".to_string(),
                service_linking_function: "basic".to_string(),
                gateway_delegation_function: "basic".to_string(),
                gateway_undelegation_function: "basic".to_string(),
                relay_requests_function: "test".to_string(),
                submit_relay_requests_function: "basic_gamma".to_string(),
                submit_relay_requests_policy_function: "V1".to_string(),
                application_leave_function: "basic".to_string(),
                servicer_leave_function: "basic".to_string(),
                gateway_leave_function: "basic".to_string(),
                service_leave_function: "basic".to_string(),
                service_unlinking_function: "basic".to_string(),
                servicer_stake_function: "basic".to_string(),
                application_stake_function: "basic".to_string(),
                gateway_stake_function: "basic".to_string(),
                jailing_function: "basic".to_string(),
            },
        }
    }
}

// =============================================================================
// STRATEGIES
// =============================================================================

macro_rules! strategy_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => [$($alias:literal),+]),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($($alias)|+ => Ok($name::$variant),)+
                    _ => Err(s.to_string()),
                }
            }
        }
    };
}

strategy_enum! {
    /// Threshold-based join decision.
    JoinStrategy {
        // The misspelling is the canonical configuration value.
        SimpleUniform => ["simple_unfiform", "simple_uniform"],
    }
}

strategy_enum! {
    /// Which applications delegate to a gateway.
    DelegationStrategy {
        Test => ["test"],
        Basic => ["basic"],
    }
}

strategy_enum! {
    /// Single-variant selector shared by sweep-style actions.
    BasicStrategy {
        Basic => ["basic"],
    }
}

strategy_enum! {
    /// How the relay-serving leg locates its session.
    RelayServingStrategy {
        Test => ["test"],
    }
}

strategy_enum! {
    /// How many relays an application requests.
    SubmitRelayStrategy {
        Test => ["test"],
        BasicGamma => ["basic_gamma"],
    }
}

strategy_enum! {
    /// Session admission policy for relay requests.
    SubmitRelayPolicy {
        V1 => ["V1", "v1"],
    }
}

/// Every stage variant, resolved once from `FunctionalParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategies {
    pub application_join: JoinStrategy,
    pub servicer_join: JoinStrategy,
    pub gateway_join: JoinStrategy,
    pub service_join: JoinStrategy,
    pub service_linking: BasicStrategy,
    pub gateway_delegation: DelegationStrategy,
    pub gateway_undelegation: BasicStrategy,
    pub relay_requests: RelayServingStrategy,
    pub submit_relay_requests: SubmitRelayStrategy,
    pub submit_relay_requests_policy: SubmitRelayPolicy,
    pub application_leave: BasicStrategy,
    pub servicer_leave: BasicStrategy,
    pub gateway_leave: BasicStrategy,
    pub service_leave: BasicStrategy,
    pub service_unlinking: BasicStrategy,
    pub servicer_stake: BasicStrategy,
    pub application_stake: BasicStrategy,
    pub gateway_stake: BasicStrategy,
    pub jailing: BasicStrategy,
}

fn resolve<T: FromStr<Err = String>>(key: &'static str, value: &str) -> Result<T, ConfigurationError> {
    value
        .parse()
        .map_err(|value| ConfigurationError::UnknownFunction { key, value })
}

impl Strategies {
    /// Resolves every discriminator, failing on the first unknown one.
    pub fn resolve(functional: &FunctionalParams) -> Result<Self, ConfigurationError> {
        let f = functional;
        Ok(Self {
            application_join: resolve("application_join_function", &f.application_join_function)?,
            servicer_join: resolve("servicer_join_function", &f.servicer_join_function)?,
            gateway_join: resolve("gateway_join_function", &f.gateway_join_function)?,
            service_join: resolve("service_join_function", &f.service_join_function)?,
            service_linking: resolve("service_linking_function", &f.service_linking_function)?,
            gateway_delegation: resolve("gateway_delegation_function", &f.gateway_delegation_function)?,
            gateway_undelegation: resolve("gateway_undelegation_function", &f.gateway_undelegation_function)?,
            relay_requests: resolve("relay_requests_function", &f.relay_requests_function)?,
            submit_relay_requests: resolve("submit_relay_requests_function", &f.submit_relay_requests_function)?,
            submit_relay_requests_policy: resolve(
                "submit_relay_requests_policy_function",
                &f.submit_relay_requests_policy_function,
            )?,
            application_leave: resolve("application_leave_function", &f.application_leave_function)?,
            servicer_leave: resolve("servicer_leave_function", &f.servicer_leave_function)?,
            gateway_leave: resolve("gateway_leave_function", &f.gateway_leave_function)?,
            service_leave: resolve("service_leave_function", &f.service_leave_function)?,
            service_unlinking: resolve("service_unlinking_function", &f.service_unlinking_function)?,
            servicer_stake: resolve("servicer_stake_function", &f.servicer_stake_function)?,
            application_stake: resolve("application_stake_function", &f.application_stake_function)?,
            gateway_stake: resolve("gateway_stake_function", &f.gateway_stake_function)?,
            jailing: resolve("jailing_function", &f.jailing_function)?,
        })
    }
}

// =============================================================================
// RESOLVED SET
// =============================================================================

/// The validated, immutable parameter set every stage reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    pub system: SystemParams,
    pub behavior: BehaviorParams,
    pub strategies: Strategies,
}

impl ParamSet {
    /// Validates a raw table and resolves its strategies.
    pub fn from_table(table: ParamTable) -> Result<Self, ConfigurationError> {
        let strategies = Strategies::resolve(&table.functional)?;
        validate(&table.system, &table.behavior)?;
        Ok(Self {
            system: table.system,
            behavior: table.behavior,
            strategies,
        })
    }

    /// Loads a built-in preset.
    pub fn preset(name: &str) -> Result<Self, ConfigurationError> {
        Self::from_table(ParamTable::preset(name)?)
    }

    /// Parses and resolves a flat JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Self::from_table(ParamTable::from_json_str(json)?)
    }

    /// Mean relays per session (`shape * scale` of the Gamma law).
    pub fn average_relays_per_session(&self) -> f64 {
        self.behavior.relays_per_session_gamma_distribution_shape
            * self.behavior.relays_per_session_gamma_distribution_scale
    }
}

fn check_probability(key: &'static str, p: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(key, format!("{} is not a probability", p)))
    }
}

fn check_non_negative(key: &'static str, v: f64) -> Result<(), ConfigurationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(key, format!("{} must be a non-negative amount", v)))
    }
}

fn validate(system: &SystemParams, behavior: &BehaviorParams) -> Result<(), ConfigurationError> {
    check_probability("application_leave_probability", behavior.application_leave_probability)?;
    check_probability("gateway_leave_probability", behavior.gateway_leave_probability)?;
    check_probability("servicer_leave_probability", behavior.servicer_leave_probability)?;
    check_probability("service_leave_probability", behavior.service_leave_probability)?;
    check_probability("service_unlinking_probability", behavior.service_unlinking_probability)?;
    check_probability(
        "service_linking_probability_normal",
        behavior.service_linking_probability_normal,
    )?;
    check_probability(
        "service_linking_probability_just_joined",
        behavior.service_linking_probability_just_joined,
    )?;
    check_probability("kick_bottom_probability", behavior.kick_bottom_probability)?;
    check_probability("gateway_undelegation_probability", behavior.gateway_undelegation_probability)?;
    check_probability("servicer_jailing_probability", behavior.servicer_jailing_probability)?;
    check_probability("uses_gateway_probability", behavior.uses_gateway_probability)?;
    check_probability("lambda_ewm_revenue_expectation", behavior.lambda_ewm_revenue_expectation)?;
    check_probability("slash_fraction_downtime", system.slash_fraction_downtime)?;

    check_non_negative("minimum_stake_servicer", system.minimum_stake_servicer)?;
    check_non_negative("app_burn_per_session", system.app_burn_per_session)?;
    check_non_negative("app_burn_per_relay", system.app_burn_per_relay)?;
    check_non_negative("stake_per_app_delegation", system.stake_per_app_delegation)?;
    check_non_negative("gateway_minimum_stake", system.gateway_minimum_stake)?;

    if !(system.relays_to_tokens_multiplier > 0.0 && system.relays_to_tokens_multiplier.is_finite()) {
        return Err(ConfigurationError::invalid(
            "relays_to_tokens_multiplier",
            "must be a positive price per relay",
        ));
    }

    let allocations =
        system.servicer_allocation + system.dao_allocation + system.block_proposer_allocation;
    if (allocations - 1.0).abs() > 1e-9
        || system.servicer_allocation < 0.0
        || system.dao_allocation < 0.0
        || system.block_proposer_allocation < 0.0
    {
        return Err(ConfigurationError::invalid(
            "servicer_allocation",
            format!("relay payment allocations must be non-negative and sum to 1, got {}", allocations),
        ));
    }

    if behavior.application_max_number == 0
        || behavior.servicer_max_number == 0
        || behavior.gateway_max_number == 0
        || behavior.service_max_number == 0
    {
        return Err(ConfigurationError::invalid(
            "application_max_number",
            "population caps must be positive",
        ));
    }

    let shape = behavior.relays_per_session_gamma_distribution_shape;
    let scale = behavior.relays_per_session_gamma_distribution_scale;
    if !(shape > 0.0 && scale > 0.0 && shape.is_finite() && scale.is_finite()) {
        return Err(ConfigurationError::invalid(
            "relays_per_session_gamma_distribution_shape",
            format!("gamma shape {} and scale {} must be positive", shape, scale),
        ));
    }

    if system.minimum_servicers_per_session == 0
        || system.minimum_servicers_per_session > system.maximum_servicers_per_session
    {
        return Err(ConfigurationError::invalid(
            "minimum_servicers_per_session",
            "must be positive and not exceed maximum_servicers_per_session",
        ));
    }

    if behavior.applications_use_min_servicers > behavior.applications_use_max_servicers {
        return Err(ConfigurationError::invalid(
            "applications_use_min_servicers",
            "must not exceed applications_use_max_servicers",
        ));
    }

    Ok(())
}
