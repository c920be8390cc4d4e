// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! The core library for MIPSim.
//!
//! This crate simulates Mobile IP: agent discovery, registration of a
//! care-of-address with the home agent, and delivery of datagrams to a
//! mobile node away from home, either tunneled through the home agent or
//! sent directly by the correspondent and relayed by an anchor foreign
//! agent after a handoff.

// Public module declarations
pub mod address;
pub mod binding;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod message;
pub mod node;
pub mod policies;
pub mod registration;
pub mod report;
pub mod routing;
pub mod runner;
pub mod session;
pub mod store;
pub mod trace;
pub mod visitor;

// Re-export commonly used types
pub use address::{Address, AddressAllocator, LinkAddress};
pub use binding::{BindingEntry, MobilityBindingStore};
pub use config::{CliArgs, SimulationConfig};
pub use discovery::{DiscoveryMethod, DiscoveryOutcome, MobilityAgent, Network, discover};
pub use error::{
    AddressError, DiscoveryError, MipError, RegistrationError, RoutingError, SerializationError,
    SessionError, StoreError,
};
pub use export::{TraceFormat, encode_trace, export_trace};
pub use message::{
    AgentAdvertisement, AgentSolicitation, Datagram, DiscoveryMessage, Envelope, Packet,
    RegistrationMessage, RegistrationReply, RegistrationRequest,
};
pub use node::{CorrespondentNode, ForeignAgent, HomeAgent, MobileNode, NetworkContext};
pub use policies::{CapLifetime, GrantRequested, LifetimePolicy};
pub use registration::{RegistrationOutcome, RegistrationParams, register};
pub use report::{BindingTable, NodeSummary, VisitorTable};
pub use routing::{
    AnchorNotice, Delivery, HandoffOutcome, Hop, RoutingMethod, deliver_direct, deliver_indirect,
    deliver_via_anchor, handoff,
};
pub use runner::{ScenarioReport, run_scenario};
pub use session::{Session, SessionState};
pub use store::{EntryStore, StoreEntry};
pub use trace::{Trace, TraceEvent};
pub use visitor::{VisitorEntry, VisitorListStore};
