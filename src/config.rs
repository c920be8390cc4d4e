// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Configuration management for simulation runs
//!
//! Supports both command-line arguments and TOML scenario files. Either
//! way the result is a single [`SimulationConfig`] that selects the
//! protocol paths the runner takes.

use crate::address::validate_ipv4;
use crate::discovery::DiscoveryMethod;
use crate::error::{MipError, SerializationError};
use crate::export::TraceFormat;
use crate::node::NetworkContext;
use crate::routing::RoutingMethod;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Command-line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "mipsim")]
#[command(author = "MIPSim Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Mobile IP discovery, registration and routing simulator", long_about = None)]
pub struct CliArgs {
    /// Path to TOML scenario file (overrides other arguments)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Network the mobile node starts in: home or foreign
    #[arg(long, value_name = "NETWORK", default_value = "foreign")]
    pub network: NetworkContext,

    /// Agent discovery method: advertisement or solicitation
    #[arg(long, value_name = "METHOD", default_value = "advertisement")]
    pub discovery: DiscoveryMethod,

    /// Datagram routing method: indirect or direct
    #[arg(long, value_name = "METHOD", default_value = "indirect")]
    pub routing: RoutingMethod,

    /// Requested registration lifetime in seconds
    #[arg(long, value_name = "SECS", default_value_t = default_lifetime())]
    pub lifetime: u32,

    /// Longest lifetime the home agent grants (unlimited if unset)
    #[arg(long, value_name = "SECS")]
    pub max_lifetime: Option<u32>,

    /// Registration correlation id (random if unset)
    #[arg(long, value_name = "ID")]
    pub correlation_id: Option<u64>,

    /// Sequence id of the first datagram (random if unset)
    #[arg(long, value_name = "ID")]
    pub sequence_id: Option<u64>,

    /// Seed for address and id generation
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Number of foreign agents in the topology
    #[arg(long, value_name = "N", default_value_t = default_foreign_agents())]
    pub foreign_agents: usize,

    /// Pause between protocol steps in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub step_delay_ms: u64,

    /// Write the message trace to this file
    #[arg(long, value_name = "FILE")]
    pub trace_out: Option<PathBuf>,

    /// Trace file encoding: json or postcard
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub trace_format: TraceFormat,
}

/// TOML scenario file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub addresses: AddressPlan,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Scenario section of config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_network")]
    pub network: NetworkContext,
    #[serde(default = "default_discovery")]
    pub discovery: DiscoveryMethod,
    #[serde(default = "default_routing")]
    pub routing: RoutingMethod,
    #[serde(default = "default_foreign_agents")]
    pub foreign_agents: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub step_delay_ms: u64,
}

fn default_network() -> NetworkContext {
    NetworkContext::Foreign
}

fn default_discovery() -> DiscoveryMethod {
    DiscoveryMethod::Advertisement
}

fn default_routing() -> RoutingMethod {
    RoutingMethod::Indirect
}

fn default_foreign_agents() -> usize {
    2
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            discovery: default_discovery(),
            routing: default_routing(),
            foreign_agents: default_foreign_agents(),
            seed: None,
            step_delay_ms: 0,
        }
    }
}

/// Registration section of config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Requested lifetime (seconds)
    #[serde(default = "default_lifetime")]
    pub lifetime_secs: u32,
    /// Home agent's lifetime cap (seconds)
    #[serde(default)]
    pub max_lifetime_secs: Option<u32>,
    #[serde(default)]
    pub correlation_id: Option<u64>,
    #[serde(default)]
    pub sequence_id: Option<u64>,
}

fn default_lifetime() -> u32 {
    30
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: default_lifetime(),
            max_lifetime_secs: None,
            correlation_id: None,
            sequence_id: None,
        }
    }
}

/// Fixed addresses; anything left out is generated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    #[serde(default)]
    pub mobile_node: Option<String>,
    #[serde(default)]
    pub link_address: Option<String>,
    #[serde(default)]
    pub home_agent: Option<String>,
    #[serde(default)]
    pub correspondent: Option<String>,
    /// Foreign agent addresses, in index order
    #[serde(default)]
    pub foreign_agents: Vec<String>,
}

impl AddressPlan {
    /// All fixed network-layer addresses
    pub fn network_addresses(&self) -> impl Iterator<Item = &str> {
        self.mobile_node
            .iter()
            .chain(self.home_agent.iter())
            .chain(self.correspondent.iter())
            .chain(self.foreign_agents.iter())
            .map(String::as_str)
    }
}

/// Output section of config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub trace_out: Option<PathBuf>,
    #[serde(default)]
    pub trace_format: TraceFormat,
}

/// Unified configuration after parsing CLI or file
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub network: NetworkContext,
    pub discovery: DiscoveryMethod,
    pub routing: RoutingMethod,
    pub lifetime_secs: u32,
    pub max_lifetime_secs: Option<u32>,
    pub correlation_id: Option<u64>,
    pub sequence_id: Option<u64>,
    pub seed: Option<u64>,
    pub foreign_agents: usize,
    pub step_delay_ms: u64,
    pub addresses: AddressPlan,
    pub trace_out: Option<PathBuf>,
    pub trace_format: TraceFormat,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

impl SimulationConfig {
    /// Creates configuration from command-line arguments
    pub fn from_cli(args: CliArgs) -> Result<Self, MipError> {
        // If config file is specified, load from file
        if let Some(config_path) = args.config {
            return Self::from_file(&config_path);
        }

        Ok(Self {
            network: args.network,
            discovery: args.discovery,
            routing: args.routing,
            lifetime_secs: args.lifetime,
            max_lifetime_secs: args.max_lifetime,
            correlation_id: args.correlation_id,
            sequence_id: args.sequence_id,
            seed: args.seed,
            foreign_agents: args.foreign_agents,
            step_delay_ms: args.step_delay_ms,
            addresses: AddressPlan::default(),
            trace_out: args.trace_out,
            trace_format: args.trace_format,
        })
    }

    /// Loads configuration from a TOML scenario file
    pub fn from_file(path: &Path) -> Result<Self, MipError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses a TOML scenario
    pub fn from_toml_str(contents: &str) -> Result<Self, MipError> {
        let config: TomlConfig = toml::from_str(contents).map_err(SerializationError::from)?;
        Ok(Self::from_toml(config))
    }

    fn from_toml(config: TomlConfig) -> Self {
        Self {
            network: config.scenario.network,
            discovery: config.scenario.discovery,
            routing: config.scenario.routing,
            lifetime_secs: config.registration.lifetime_secs,
            max_lifetime_secs: config.registration.max_lifetime_secs,
            correlation_id: config.registration.correlation_id,
            sequence_id: config.registration.sequence_id,
            seed: config.scenario.seed,
            foreign_agents: config.scenario.foreign_agents,
            step_delay_ms: config.scenario.step_delay_ms,
            addresses: config.addresses,
            trace_out: config.output.trace_out,
            trace_format: config.output.trace_format,
        }
    }

    /// Number of foreign agents the configured path visits
    pub fn required_foreign_agents(&self) -> usize {
        match (self.network, self.routing) {
            (NetworkContext::Foreign, RoutingMethod::Direct) => 2,
            _ => 1,
        }
    }

    /// Validates configuration
    pub fn validate(&self) -> Result<(), MipError> {
        if self.lifetime_secs == 0 {
            return Err("Registration lifetime must be positive".into());
        }
        if self.max_lifetime_secs == Some(0) {
            return Err("Maximum lifetime must be positive".into());
        }
        if self.foreign_agents < self.required_foreign_agents() {
            return Err(format!(
                "{} routing from a {} network needs at least {} foreign agent(s), got {}",
                self.routing,
                self.network,
                self.required_foreign_agents(),
                self.foreign_agents
            )
            .into());
        }
        if self.network == NetworkContext::Foreign && self.routing == RoutingMethod::Direct {
            // The handoff reuses both ids incremented by one
            if self.sequence_id == Some(u64::MAX) {
                return Err(format!(
                    "Sequence id {} leaves no id for the datagram after handoff",
                    u64::MAX
                )
                .into());
            }
            if self.correlation_id == Some(u64::MAX) {
                return Err(format!(
                    "Correlation id {} leaves no id for the handoff registration",
                    u64::MAX
                )
                .into());
            }
        }
        if self.addresses.foreign_agents.len() > self.foreign_agents {
            return Err(format!(
                "{} foreign agent addresses given for {} foreign agent(s)",
                self.addresses.foreign_agents.len(),
                self.foreign_agents
            )
            .into());
        }
        for addr in self.addresses.network_addresses() {
            validate_ipv4(addr)?;
        }
        if self
            .addresses
            .link_address
            .as_deref()
            .is_some_and(|link| link.trim().is_empty())
        {
            return Err("Link address must not be empty".into());
        }
        Ok(())
    }

    /// Prints configuration summary
    pub fn print_summary(&self) {
        println!("=== Simulation Configuration ===");
        println!("Network: {}", self.network);
        println!("Discovery: {}", self.discovery);
        if self.network == NetworkContext::Foreign {
            println!("Routing: {}", self.routing);
            println!("Requested Lifetime: {}s", self.lifetime_secs);
            if let Some(max) = self.max_lifetime_secs {
                println!("Lifetime Cap: {}s", max);
            }
            println!("Foreign Agents: {}", self.foreign_agents);
        }
        if let Some(seed) = self.seed {
            println!("Seed: {}", seed);
        }
        if let Some(path) = &self.trace_out {
            println!("Trace Output: {} ({})", path.display(), self.trace_format);
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.network, NetworkContext::Foreign);
        assert_eq!(config.lifetime_secs, 30);
        assert_eq!(config.foreign_agents, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_scenario() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [scenario]
            network = "foreign"
            discovery = "solicitation"
            routing = "direct"
            seed = 7

            [registration]
            lifetime_secs = 45
            max_lifetime_secs = 20
            correlation_id = 77

            [addresses]
            mobile_node = "10.0.0.5"
            home_agent = "10.0.0.1"
            foreign_agents = ["20.0.0.1", "20.0.0.2"]

            [output]
            trace_format = "postcard"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery, DiscoveryMethod::Solicitation);
        assert_eq!(config.routing, RoutingMethod::Direct);
        assert_eq!(config.max_lifetime_secs, Some(20));
        assert_eq!(config.correlation_id, Some(77));
        assert_eq!(config.sequence_id, None);
        assert_eq!(config.addresses.foreign_agents.len(), 2);
        assert_eq!(config.trace_format, TraceFormat::Postcard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_direct_routing_needs_two_foreign_agents() {
        let config = SimulationConfig {
            routing: RoutingMethod::Direct,
            foreign_agents: 1,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.phase(), "configuration");

        let at_home = SimulationConfig {
            network: NetworkContext::Home,
            ..config
        };
        assert!(at_home.validate().is_ok());
    }

    #[test]
    fn test_zero_lifetime_is_rejected() {
        let config = SimulationConfig {
            lifetime_secs: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(MipError::Config(_))));
    }

    #[test]
    fn test_last_sequence_id_is_rejected_for_direct_routing() {
        let config = SimulationConfig {
            routing: RoutingMethod::Direct,
            sequence_id: Some(u64::MAX),
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MipError::Config(_)));
        assert!(err.to_string().contains("after handoff"));

        let max_correlation = SimulationConfig {
            sequence_id: Some(7),
            correlation_id: Some(u64::MAX),
            ..config
        };
        assert!(matches!(max_correlation.validate(), Err(MipError::Config(_))));

        // Indirect routing never hands off
        let indirect = SimulationConfig {
            routing: RoutingMethod::Indirect,
            sequence_id: Some(u64::MAX),
            correlation_id: Some(u64::MAX),
            ..SimulationConfig::default()
        };
        assert!(indirect.validate().is_ok());
    }

    #[test]
    fn test_malformed_fixed_address_is_rejected() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [addresses]
            home_agent = "10.0.0.256"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(MipError::Address(_))));
    }

    #[test]
    fn test_unknown_network_fails_to_parse() {
        let err = SimulationConfig::from_toml_str("[scenario]\nnetwork = \"orbit\"\n").unwrap_err();
        assert!(matches!(err, MipError::Serialization(_)));
    }

    #[test]
    fn test_cli_arguments() {
        let args = CliArgs::parse_from([
            "mipsim",
            "--discovery",
            "solicitation",
            "--routing",
            "direct",
            "--lifetime",
            "60",
            "--seed",
            "3",
        ]);
        let config = SimulationConfig::from_cli(args).unwrap();
        assert_eq!(config.discovery, DiscoveryMethod::Solicitation);
        assert_eq!(config.routing, RoutingMethod::Direct);
        assert_eq!(config.lifetime_secs, 60);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.trace_format, TraceFormat::Json);
    }
}
