//! Genesis: the initial World State of a trial.

use crate::boundary_actions::application_stake_target;
use crate::error::SimError;
use pokt_core::{Application, ConfigurationError, Gateway, ParamSet, Servicer, WorldState};
use pokt_env::AgentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relay chain identifiers used to name the genesis service catalog.
const CHAIN_IDS: [&str; 12] = [
    "0001", "0003", "0004", "0005", "0009", "0021", "0027", "0040", "0047", "0049", "0053", "0056",
];

/// Population counts of the initial network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub services: usize,
    pub servicers: usize,
    pub applications: usize,
    pub gateways: usize,

    /// Links per servicer, capped by the catalog size
    pub services_per_servicer: usize,
}

impl GenesisConfig {
    /// A handful of agents; every stage fires within a few blocks.
    pub fn test() -> Self {
        Self {
            services: 3,
            servicers: 4,
            applications: 3,
            gateways: 1,
            services_per_servicer: 2,
        }
    }

    pub fn base() -> Self {
        Self {
            services: 10,
            servicers: 10,
            applications: 10,
            gateways: 3,
            services_per_servicer: 3,
        }
    }

    /// Returns a built-in configuration by name (`"test"` or `"base"`).
    pub fn preset(name: &str) -> Result<Self, ConfigurationError> {
        match name.to_lowercase().as_str() {
            "test" => Ok(Self::test()),
            "base" => Ok(Self::base()),
            _ => Err(ConfigurationError::UnknownPreset(name.to_string())),
        }
    }

    /// Builds the initial state through the regular admission methods.
    ///
    /// Servicer `i` links `services_per_servicer` consecutive services
    /// starting at `i` (wrapping), application `i` uses service `i`
    /// (wrapping). Servicers start at the minimum stake, applications at
    /// their stake target and gateways at the gateway minimum.
    pub fn build(&self, params: &ParamSet) -> Result<WorldState, SimError> {
        let mut state = WorldState::new();
        let catalog: Vec<AgentId> = (0..self.services)
            .map(|i| state.add_service(service_name(i)))
            .collect();

        let links = self.services_per_servicer.min(catalog.len());
        let min_servicer = params.system.minimum_stake_servicer;
        for i in 0..self.servicers {
            let services = (0..links).map(|k| catalog[(i + k) % catalog.len()]).collect();
            state.admit_servicer(|id| {
                Servicer::new(id, format!("servicer-{}", i), min_servicer, min_servicer, services, "ABC", 1.0)
            })?;
        }

        let app_stake = application_stake_target(params);
        for i in 0..self.applications {
            let services = catalog.get(i % catalog.len().max(1)).copied().into_iter().collect();
            state.admit_application(|id| {
                Application::new(id, format!("application-{}", i), 100.0, app_stake, services, "ABC", 1)
            })?;
        }

        let gateway_stake = params.system.gateway_minimum_stake;
        for i in 0..self.gateways {
            state.admit_gateway(|id| {
                Gateway::new(id, format!("gateway-{}", i), gateway_stake * 10.0, gateway_stake)
            })?;
        }

        debug!(
            "Genesis: {} services, {} servicers, {} applications, {} gateways",
            self.services, self.servicers, self.applications, self.gateways
        );
        Ok(state)
    }
}

pub(crate) fn service_name(i: usize) -> String {
    match CHAIN_IDS.get(i) {
        Some(chain) => chain.to_string(),
        None => format!("{:04}", 1000 + i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_links_catalog() {
        let params = ParamSet::preset("test").unwrap();
        let state = GenesisConfig::test().build(&params).unwrap();

        assert_eq!(state.services().len(), 3);
        assert_eq!(state.servicers().len(), 4);
        assert_eq!(state.applications().len(), 3);
        assert_eq!(state.gateways().len(), 1);

        // servicer 3 wraps around to services 0 and 0+1
        let s3 = state.servicer(AgentId(3)).unwrap();
        assert_eq!(s3.services, vec![AgentId(0), AgentId(1)]);
        let linked: usize = state.services().values().map(|s| s.servicers.len()).sum();
        assert_eq!(linked, 8);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_empty_catalog_builds_serviceless_agents() {
        let params = ParamSet::preset("test").unwrap();
        let config = GenesisConfig {
            services: 0,
            ..GenesisConfig::test()
        };
        let state = config.build(&params).unwrap();
        assert!(state.servicers().values().all(|s| s.services.is_empty()));
        assert!(state.applications().values().all(|a| a.services.is_empty()));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(GenesisConfig::preset("mainnet").is_err());
        assert_eq!(GenesisConfig::preset("Base").unwrap(), GenesisConfig::base());
    }
}
