// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Error types for MIPSim
//!
//! Every protocol phase has its own typed error. They are aggregated into
//! [`MipError`], which also classifies failures into the precondition
//! violations and lookup misses the simulator distinguishes.

use crate::address::Address;
use thiserror::Error;

/// Main error type for MIPSim operations
#[derive(Error, Debug)]
pub enum MipError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MipError {
    /// Names the protocol phase (or ambient layer) the failure belongs to
    pub fn phase(&self) -> &'static str {
        match self {
            MipError::Discovery(_) => "discovery",
            MipError::Registration(_) => "registration",
            MipError::Routing(_) => "routing",
            MipError::Session(_) => "session",
            MipError::Address(_) => "addressing",
            MipError::Config(_) => "configuration",
            MipError::Serialization(_) => "serialization",
            MipError::Io(_) => "io",
        }
    }

    /// Whether this is a fatal precondition violation of a protocol operation
    pub fn is_precondition_violation(&self) -> bool {
        match self {
            MipError::Registration(_) | MipError::Session(_) => true,
            MipError::Routing(e) => e.is_precondition_violation(),
            _ => false,
        }
    }
}

/// Discovery errors
///
/// Discovery itself never fails; these only arise when a scenario names
/// an agent the topology does not contain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("No foreign agent at index {index} ({count} configured)")]
    UnknownForeignAgent { index: usize, count: usize },
}

/// Registration errors, all of them precondition violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Mobile node {0} is in its home network; registration is not needed")]
    NodeAtHome(Address),

    #[error("Request addressed to home agent {requested}, but received by {actual}")]
    WrongHomeAgent { requested: Address, actual: Address },

    #[error("Correlation id {correlation_id} already has an outstanding request at {foreign_agent}")]
    CorrelationInUse {
        correlation_id: u64,
        foreign_agent: Address,
    },

    #[error("Reply with correlation id {correlation_id} matches no outstanding request")]
    UnknownCorrelation { correlation_id: u64 },
}

/// Routing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Home agent {home_agent} has no binding for {home_address}")]
    NoBinding {
        home_agent: Address,
        home_address: Address,
    },

    #[error("Foreign agent {foreign_agent} has no visitor entry for {home_address}")]
    NoVisitorEntry {
        foreign_agent: Address,
        home_address: Address,
    },

    #[error("Tunnel addressed to {outer_destination} arrived at {foreign_agent}")]
    MisdirectedTunnel {
        outer_destination: Address,
        foreign_agent: Address,
    },

    #[error("Datagram for {destination} delivered to mobile node {node}")]
    NotAddressedToNode { destination: Address, node: Address },

    #[error("Correspondent {correspondent} has no anchor for {home_address}")]
    NoAnchor {
        correspondent: Address,
        home_address: Address,
    },

    #[error("Anchor {anchor} has no forwarding address for {home_address}")]
    NoForwarding {
        anchor: Address,
        home_address: Address,
    },

    #[error("Foreign agent {foreign_agent} never served {home_address} and cannot anchor it")]
    NotAnchored {
        foreign_agent: Address,
        home_address: Address,
    },

    #[error("Handoff target {0} is already the anchor")]
    SameForeignAgent(Address),

    #[error("Handoff registration failed: {0}")]
    Registration(#[from] RegistrationError),
}

impl RoutingError {
    /// Lookup misses surface as defects; everything else is a precondition
    /// the caller failed to establish.
    pub fn is_precondition_violation(&self) -> bool {
        !matches!(
            self,
            RoutingError::NoBinding { .. } | RoutingError::NoVisitorEntry { .. }
        )
    }
}

/// Store-layer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{store}: no entry for {key}")]
    NotFound { store: &'static str, key: Address },
}

/// Session state machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },
}

/// Address allocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address already allocated: {0}")]
    Duplicate(String),

    #[error("Could not find a free address after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Invalid address: {0}")]
    Invalid(String),
}

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Postcard serialization failed: {0}")]
    PostcardSerialization(#[from] postcard::Error),

    #[error("JSON serialization failed: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("TOML parsing failed: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl From<String> for MipError {
    fn from(s: String) -> Self {
        MipError::Config(s)
    }
}

impl From<&str> for MipError {
    fn from(s: &str) -> Self {
        MipError::Config(s.to_string())
    }
}
