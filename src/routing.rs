// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Datagram Routing
//!
//! Delivers a correspondent's datagram to a mobile node away from home.
//!
//! # Strategies
//! - Indirect: the home agent intercepts the datagram and tunnels it to
//!   the bound care-of-address.
//! - Direct: the correspondent asks the home agent for the care-of-address
//!   and tunnels to it itself. The first foreign agent it learns becomes
//!   the node's anchor; after a handoff the anchor relays to the node's new
//!   foreign agent.
//!
//! Every strategy ends with a foreign agent stripping the last tunnel and
//! the node receiving the original datagram unchanged.

use crate::address::Address;
use crate::discovery::{DiscoveryMethod, DiscoveryOutcome, Network, discover};
use crate::error::RoutingError;
use crate::message::{Datagram, Packet};
use crate::node::{CorrespondentNode, ForeignAgent, HomeAgent, MobileNode};
use crate::registration::{RegistrationOutcome, RegistrationParams, prepare_request, register};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMethod {
    Indirect,
    Direct,
}

impl fmt::Display for RoutingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMethod::Indirect => write!(f, "indirect"),
            RoutingMethod::Direct => write!(f, "direct"),
        }
    }
}

impl std::str::FromStr for RoutingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indirect" => Ok(RoutingMethod::Indirect),
            "direct" => Ok(RoutingMethod::Direct),
            _ => Err(format!(
                "Invalid routing method: {}. Use 'indirect' or 'direct'",
                s
            )),
        }
    }
}

/// A packet crossing one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub from: Address,
    pub to: Address,
    pub packet: Packet,
}

/// Control-path query of the home agent by the correspondent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingQuery {
    pub correspondent: Address,
    pub home_agent: Address,
    pub home_address: Address,
    pub care_of_address: Address,
}

/// Notice from a node's new foreign agent to its anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorNotice {
    pub from: Address,
    pub anchor: Address,
    pub home_address: Address,
    pub care_of_address: Address,
}

/// A completed delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub method: RoutingMethod,
    /// Care-of-address query made before sending (direct routing only)
    pub query: Option<BindingQuery>,
    /// Data-path hops, in order
    pub hops: Vec<Hop>,
    /// The datagram as the mobile node received it
    pub received: Datagram,
    /// Tunnel headers stripped on the way
    pub unwraps: usize,
}

impl Delivery {
    /// Addresses every data-path hop was routed to
    pub fn data_path(&self) -> impl Iterator<Item = &Address> {
        self.hops.iter().map(|hop| hop.packet.routed_destination())
    }

    /// The last hop, which hands the datagram to the node
    pub fn final_hop(&self) -> Option<&Hop> {
        self.hops.last()
    }
}

/// Result of moving an anchored node to a new foreign agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffOutcome {
    pub discovery: DiscoveryOutcome,
    pub registration: RegistrationOutcome,
    pub notice: AnchorNotice,
}

fn ensure_addressed_to(datagram: &Datagram, node: &MobileNode) -> Result<(), RoutingError> {
    if datagram.destination != *node.address() {
        return Err(RoutingError::NotAddressedToNode {
            destination: datagram.destination.clone(),
            node: node.address().clone(),
        });
    }
    Ok(())
}

/// Delivers `datagram` through the home agent's tunnel
pub fn deliver_indirect(
    datagram: Datagram,
    home_agent: &HomeAgent,
    foreign_agent: &ForeignAgent,
    node: &mut MobileNode,
) -> Result<Delivery, RoutingError> {
    ensure_addressed_to(&datagram, node)?;
    let mut hops = Vec::with_capacity(3);

    hops.push(Hop {
        from: datagram.source.clone(),
        to: home_agent.address().clone(),
        packet: Packet::Plain(datagram.clone()),
    });

    let envelope = home_agent.tunnel(datagram)?;
    log::info!(
        "Home agent {}: tunneling datagram #{} to {}",
        home_agent.address(),
        envelope.inner.sequence_id,
        envelope.outer_destination
    );
    hops.push(Hop {
        from: home_agent.address().clone(),
        to: envelope.outer_destination.clone(),
        packet: Packet::Tunneled(envelope.clone()),
    });

    let inner = foreign_agent.decapsulate(envelope)?;
    log::info!(
        "Foreign agent {}: decapsulated datagram #{} for {}",
        foreign_agent.address(),
        inner.sequence_id,
        inner.destination
    );
    hops.push(Hop {
        from: foreign_agent.address().clone(),
        to: node.address().clone(),
        packet: Packet::Plain(inner.clone()),
    });

    let received = node.receive(inner)?;
    Ok(Delivery {
        method: RoutingMethod::Indirect,
        query: None,
        hops,
        received,
        unwraps: 1,
    })
}

/// Delivers `datagram` by tunneling straight from the correspondent to the care-of-address
pub fn deliver_direct(
    datagram: Datagram,
    correspondent: &mut CorrespondentNode,
    home_agent: &HomeAgent,
    foreign_agent: &ForeignAgent,
    node: &mut MobileNode,
) -> Result<Delivery, RoutingError> {
    ensure_addressed_to(&datagram, node)?;

    let care_of = home_agent.care_of_address(&datagram.destination)?.clone();
    log::info!(
        "Correspondent {}: home agent {} reports {} at {}",
        correspondent.address(),
        home_agent.address(),
        datagram.destination,
        care_of
    );
    let query = BindingQuery {
        correspondent: correspondent.address().clone(),
        home_agent: home_agent.address().clone(),
        home_address: datagram.destination.clone(),
        care_of_address: care_of.clone(),
    };

    let envelope = correspondent.tunnel(datagram, care_of.clone());
    let mut hops = vec![Hop {
        from: correspondent.address().clone(),
        to: care_of.clone(),
        packet: Packet::Tunneled(envelope.clone()),
    }];

    let inner = foreign_agent.decapsulate(envelope)?;
    log::info!(
        "Foreign agent {}: decapsulated datagram #{} for {}",
        foreign_agent.address(),
        inner.sequence_id,
        inner.destination
    );
    correspondent.learn_anchor(&inner.destination, &care_of);
    hops.push(Hop {
        from: foreign_agent.address().clone(),
        to: node.address().clone(),
        packet: Packet::Plain(inner.clone()),
    });

    let received = node.receive(inner)?;
    Ok(Delivery {
        method: RoutingMethod::Direct,
        query: Some(query),
        hops,
        received,
        unwraps: 1,
    })
}

/// Moves an anchored node to `new_foreign_agent`
///
/// The node discovers the new agent and registers through it; the new
/// agent then tells the anchor where to forward the node's traffic.
pub fn handoff(
    node: &mut MobileNode,
    home_agent: &mut HomeAgent,
    anchor: &mut ForeignAgent,
    new_foreign_agent: &mut ForeignAgent,
    method: DiscoveryMethod,
    params: RegistrationParams,
) -> Result<HandoffOutcome, RoutingError> {
    if anchor.address() == new_foreign_agent.address() {
        return Err(RoutingError::SameForeignAgent(anchor.address().clone()));
    }
    if !anchor.has_visitor(node.address()) {
        return Err(RoutingError::NotAnchored {
            foreign_agent: anchor.address().clone(),
            home_address: node.address().clone(),
        });
    }
    prepare_request(node, home_agent, new_foreign_agent, params)?;

    log::info!(
        "Mobile node {}: moving from {} to {}",
        node.address(),
        anchor.address(),
        new_foreign_agent.address()
    );
    let discovery = discover(node, Network::Foreign(&*new_foreign_agent), method);
    let registration = register(node, home_agent, new_foreign_agent, params)?;

    let notice = AnchorNotice {
        from: new_foreign_agent.address().clone(),
        anchor: anchor.address().clone(),
        home_address: node.address().clone(),
        care_of_address: new_foreign_agent.address().clone(),
    };
    anchor.set_forwarding(notice.home_address.clone(), notice.care_of_address.clone());
    log::info!(
        "Foreign agent {}: notified anchor {} of new care-of-address {}",
        notice.from,
        notice.anchor,
        notice.care_of_address
    );

    Ok(HandoffOutcome {
        discovery,
        registration,
        notice,
    })
}

/// Delivers `datagram` through the node's anchor after a handoff
pub fn deliver_via_anchor(
    datagram: Datagram,
    correspondent: &CorrespondentNode,
    anchor: &ForeignAgent,
    foreign_agent: &ForeignAgent,
    node: &mut MobileNode,
) -> Result<Delivery, RoutingError> {
    ensure_addressed_to(&datagram, node)?;

    let anchor_addr = correspondent.anchor_for(&datagram.destination)?.clone();
    if anchor_addr != *anchor.address() {
        return Err(RoutingError::MisdirectedTunnel {
            outer_destination: anchor_addr,
            foreign_agent: anchor.address().clone(),
        });
    }

    let envelope = correspondent.tunnel(datagram, anchor_addr);
    let mut hops = vec![Hop {
        from: correspondent.address().clone(),
        to: anchor.address().clone(),
        packet: Packet::Tunneled(envelope.clone()),
    }];

    let forwarded = anchor.retunnel(envelope)?;
    log::info!(
        "Anchor {}: forwarding datagram #{} to {}",
        anchor.address(),
        forwarded.inner.sequence_id,
        forwarded.outer_destination
    );
    hops.push(Hop {
        from: anchor.address().clone(),
        to: forwarded.outer_destination.clone(),
        packet: Packet::Tunneled(forwarded.clone()),
    });

    let inner = foreign_agent.decapsulate(forwarded)?;
    log::info!(
        "Foreign agent {}: decapsulated datagram #{} for {}",
        foreign_agent.address(),
        inner.sequence_id,
        inner.destination
    );
    hops.push(Hop {
        from: foreign_agent.address().clone(),
        to: node.address().clone(),
        packet: Packet::Plain(inner.clone()),
    });

    let received = node.receive(inner)?;
    Ok(Delivery {
        method: RoutingMethod::Direct,
        query: None,
        hops,
        received,
        unwraps: 2,
    })
}
