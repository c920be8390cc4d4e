// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Mobile IP node roles
//!
//! Each agent owns its own table: the home agent its mobility binding
//! table, every foreign agent its visitor list. Protocol functions borrow
//! the agents they act on; nothing is shared between agents.

use crate::address::{Address, LinkAddress};
use crate::binding::{BindingEntry, MobilityBindingStore};
use crate::discovery::MobilityAgent;
use crate::error::{RegistrationError, RoutingError};
use crate::message::{AgentAdvertisement, Datagram, Envelope, RegistrationReply, RegistrationRequest};
use crate::policies::{GrantRequested, LifetimePolicy, granted_lifetime};
use crate::visitor::{VisitorEntry, VisitorListStore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Which network the mobile node is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkContext {
    Home,
    Foreign,
}

impl fmt::Display for NetworkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkContext::Home => write!(f, "home"),
            NetworkContext::Foreign => write!(f, "foreign"),
        }
    }
}

impl std::str::FromStr for NetworkContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(NetworkContext::Home),
            "foreign" => Ok(NetworkContext::Foreign),
            _ => Err(format!("Invalid network: {}. Use 'home' or 'foreign'", s)),
        }
    }
}

/// The mobile node
#[derive(Debug, Clone)]
pub struct MobileNode {
    /// Permanent home address
    address: Address,
    /// Link-layer address
    link_address: LinkAddress,
    /// Address of the node's home agent
    home_agent: Address,
    /// Current care-of-address (None while at home)
    care_of: Option<Address>,
    /// Network the node is currently attached to
    location: NetworkContext,
    /// Datagrams delivered to this node, in arrival order
    received: Vec<Datagram>,
}

impl MobileNode {
    /// Creates a mobile node attached to its home network
    pub fn new(address: Address, link_address: LinkAddress, home_agent: Address) -> Self {
        Self {
            address,
            link_address,
            home_agent,
            care_of: None,
            location: NetworkContext::Home,
            received: Vec::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn link_address(&self) -> &LinkAddress {
        &self.link_address
    }

    pub fn home_agent(&self) -> &Address {
        &self.home_agent
    }

    pub fn care_of(&self) -> Option<&Address> {
        self.care_of.as_ref()
    }

    pub fn location(&self) -> NetworkContext {
        self.location
    }

    pub fn is_at_home(&self) -> bool {
        self.location == NetworkContext::Home
    }

    /// Attaches to a foreign network under the given care-of-address
    pub(crate) fn attach_foreign(&mut self, care_of: Address) {
        self.location = NetworkContext::Foreign;
        self.care_of = Some(care_of);
    }

    /// Returns to the home network, dropping the care-of-address
    pub(crate) fn return_home(&mut self) {
        self.location = NetworkContext::Home;
        self.care_of = None;
    }

    /// Accepts a plain datagram addressed to this node
    pub fn receive(&mut self, datagram: Datagram) -> Result<Datagram, RoutingError> {
        if datagram.destination != self.address {
            return Err(RoutingError::NotAddressedToNode {
                destination: datagram.destination,
                node: self.address.clone(),
            });
        }
        self.received.push(datagram.clone());
        Ok(datagram)
    }

    /// All datagrams received so far
    pub fn received(&self) -> &[Datagram] {
        &self.received
    }
}

/// The home agent
#[derive(Debug)]
pub struct HomeAgent {
    address: Address,
    bindings: MobilityBindingStore,
    lifetime_policy: Box<dyn LifetimePolicy>,
}

impl HomeAgent {
    /// Creates a home agent that grants requested lifetimes unchanged
    pub fn new(address: Address) -> Self {
        Self::with_policy(address, Box::new(GrantRequested))
    }

    /// Creates a home agent with a custom lifetime policy
    pub fn with_policy(address: Address, lifetime_policy: Box<dyn LifetimePolicy>) -> Self {
        Self {
            address,
            bindings: MobilityBindingStore::new(),
            lifetime_policy,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Read-only view of the mobility binding table
    pub fn bindings(&self) -> &MobilityBindingStore {
        &self.bindings
    }

    pub fn lifetime_policy(&self) -> &dyn LifetimePolicy {
        self.lifetime_policy.as_ref()
    }

    /// Checks that a request is addressed to this home agent
    pub fn check_request(&self, request: &RegistrationRequest) -> Result<(), RegistrationError> {
        if request.home_agent != self.address {
            return Err(RegistrationError::WrongHomeAgent {
                requested: request.home_agent.clone(),
                actual: self.address.clone(),
            });
        }
        Ok(())
    }

    /// Accepts a forwarded registration request
    ///
    /// Updates the binding for the mobile node and builds the reply.
    pub fn process_request(
        &mut self,
        request: &RegistrationRequest,
    ) -> Result<(BindingEntry, RegistrationReply), RegistrationError> {
        self.check_request(request)?;

        let granted = granted_lifetime(self.lifetime_policy.as_ref(), request.lifetime_secs);
        let binding = BindingEntry {
            home_address: request.mobile_node.clone(),
            care_of_address: request.care_of_address.clone(),
            lifetime_secs: granted,
        };
        self.bindings.upsert(binding.clone());

        Ok((binding, RegistrationReply::answering(request, granted)))
    }

    /// Answers a care-of-address query for a mobile node
    pub fn care_of_address(&self, home_address: &Address) -> Result<&Address, RoutingError> {
        self.bindings
            .lookup(home_address)
            .map(|binding| &binding.care_of_address)
            .map_err(|_| RoutingError::NoBinding {
                home_agent: self.address.clone(),
                home_address: home_address.clone(),
            })
    }

    /// Intercepts a datagram for a mobile node and tunnels it to the bound care-of-address
    pub fn tunnel(&self, datagram: Datagram) -> Result<Envelope, RoutingError> {
        let care_of = self.care_of_address(&datagram.destination)?.clone();
        Ok(datagram.encapsulate(self.address.clone(), care_of))
    }
}

impl MobilityAgent for HomeAgent {
    fn address(&self) -> &Address {
        &self.address
    }

    fn advertise(&self) -> AgentAdvertisement {
        AgentAdvertisement {
            advertiser: self.address.clone(),
            home_agent: true,
            foreign_agent: false,
            registration_required: false,
            care_of_addresses: VecDeque::from(vec![self.address.clone()]),
        }
    }
}

/// A foreign agent
#[derive(Debug, Clone)]
pub struct ForeignAgent {
    address: Address,
    visitors: VisitorListStore,
    /// Outstanding registration requests: correlation id -> mobile node
    pending: HashMap<u64, Address>,
    /// New care-of-addresses of nodes that moved on while this agent anchors them
    forwarding: HashMap<Address, Address>,
}

impl ForeignAgent {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            visitors: VisitorListStore::new(),
            pending: HashMap::new(),
            forwarding: HashMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Read-only view of the visitor list
    pub fn visitors(&self) -> &VisitorListStore {
        &self.visitors
    }

    pub fn has_visitor(&self, home_address: &Address) -> bool {
        self.visitors.contains(home_address)
    }

    /// Number of requests relayed to a home agent and not yet answered
    pub fn outstanding_requests(&self) -> usize {
        self.pending.len()
    }

    /// Checks that a request can be accepted for relaying
    pub fn check_request(&self, request: &RegistrationRequest) -> Result<(), RegistrationError> {
        if self.pending.contains_key(&request.correlation_id) {
            return Err(RegistrationError::CorrelationInUse {
                correlation_id: request.correlation_id,
                foreign_agent: self.address.clone(),
            });
        }
        Ok(())
    }

    /// Accepts a request from a visiting node and records the visit
    pub fn record_visit(
        &mut self,
        request: &RegistrationRequest,
        link_address: &LinkAddress,
    ) -> Result<VisitorEntry, RegistrationError> {
        self.check_request(request)?;

        self.pending
            .insert(request.correlation_id, request.mobile_node.clone());

        let entry = VisitorEntry {
            home_address: request.mobile_node.clone(),
            home_agent_address: request.home_agent.clone(),
            link_address: link_address.clone(),
            lifetime_secs: request.lifetime_secs,
        };
        self.visitors.upsert(entry.clone());
        Ok(entry)
    }

    /// Matches a home agent's reply to an outstanding request and relays it
    pub fn relay_reply(
        &mut self,
        reply: RegistrationReply,
    ) -> Result<RegistrationReply, RegistrationError> {
        let outstanding = self
            .pending
            .get(&reply.correlation_id)
            .is_some_and(|node| *node == reply.mobile_node);
        if !outstanding {
            return Err(RegistrationError::UnknownCorrelation {
                correlation_id: reply.correlation_id,
            });
        }
        self.pending.remove(&reply.correlation_id);
        Ok(reply)
    }

    /// Strips a tunnel that ends at this agent, for a node visiting here
    pub fn decapsulate(&self, envelope: Envelope) -> Result<Datagram, RoutingError> {
        self.check_tunnel_end(&envelope)?;
        if !self.has_visitor(&envelope.inner.destination) {
            return Err(RoutingError::NoVisitorEntry {
                foreign_agent: self.address.clone(),
                home_address: envelope.inner.destination,
            });
        }
        Ok(envelope.decapsulate())
    }

    /// Records where an anchored node went after a handoff
    pub fn set_forwarding(&mut self, home_address: Address, care_of: Address) {
        log::debug!(
            "Anchor {}: forwarding {} to {}",
            self.address,
            home_address,
            care_of
        );
        self.forwarding.insert(home_address, care_of);
    }

    pub fn forwarding_address(&self, home_address: &Address) -> Option<&Address> {
        self.forwarding.get(home_address)
    }

    /// Drops the forwarding address of a node this agent no longer anchors
    pub fn clear_forwarding(&mut self, home_address: &Address) -> Option<Address> {
        let removed = self.forwarding.remove(home_address);
        if let Some(care_of) = &removed {
            log::debug!(
                "Anchor {}: stopped forwarding {} to {}",
                self.address,
                home_address,
                care_of
            );
        }
        removed
    }

    /// Unwraps a tunnel ending here and re-tunnels the datagram to the node's new care-of-address
    pub fn retunnel(&self, envelope: Envelope) -> Result<Envelope, RoutingError> {
        self.check_tunnel_end(&envelope)?;
        let next = self
            .forwarding_address(&envelope.inner.destination)
            .cloned()
            .ok_or_else(|| RoutingError::NoForwarding {
                anchor: self.address.clone(),
                home_address: envelope.inner.destination.clone(),
            })?;
        Ok(envelope
            .decapsulate()
            .encapsulate(self.address.clone(), next))
    }

    fn check_tunnel_end(&self, envelope: &Envelope) -> Result<(), RoutingError> {
        if envelope.outer_destination != self.address {
            return Err(RoutingError::MisdirectedTunnel {
                outer_destination: envelope.outer_destination.clone(),
                foreign_agent: self.address.clone(),
            });
        }
        Ok(())
    }
}

impl MobilityAgent for ForeignAgent {
    fn address(&self) -> &Address {
        &self.address
    }

    fn advertise(&self) -> AgentAdvertisement {
        AgentAdvertisement {
            advertiser: self.address.clone(),
            home_agent: false,
            foreign_agent: true,
            registration_required: true,
            care_of_addresses: VecDeque::from(vec![self.address.clone()]),
        }
    }
}

/// The correspondent node
#[derive(Debug, Clone)]
pub struct CorrespondentNode {
    address: Address,
    /// Care-of-address of the latest direct delivery per mobile node, used as its anchor
    anchors: HashMap<Address, Address>,
}

impl CorrespondentNode {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            anchors: HashMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Builds a datagram addressed to a mobile node's permanent address
    pub fn datagram_to(&self, home_address: &Address, sequence_id: u64) -> Datagram {
        Datagram::new(self.address.clone(), home_address.clone(), sequence_id)
    }

    /// Tunnels a datagram straight to a care-of-address
    pub fn tunnel(&self, datagram: Datagram, care_of: Address) -> Envelope {
        datagram.encapsulate(self.address.clone(), care_of)
    }

    /// Records `care_of` as the node's anchor, returning the anchor it replaces
    pub fn learn_anchor(&mut self, home_address: &Address, care_of: &Address) -> Option<Address> {
        let previous = self.anchors.insert(home_address.clone(), care_of.clone());
        if let Some(old) = previous.as_ref().filter(|old| *old != care_of) {
            log::debug!(
                "Correspondent {}: anchor for {} moved from {} to {}",
                self.address,
                home_address,
                old,
                care_of
            );
        }
        previous
    }

    pub fn anchor_for(&self, home_address: &Address) -> Result<&Address, RoutingError> {
        self.anchors
            .get(home_address)
            .ok_or_else(|| RoutingError::NoAnchor {
                correspondent: self.address.clone(),
                home_address: home_address.clone(),
            })
    }
}
