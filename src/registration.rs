// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Mobile IP Registration
//!
//! The four-message exchange that binds a visiting mobile node to its
//! care-of-address: the node sends a request to the foreign agent, which
//! records the visit and relays the request to the home agent; the home
//! agent updates its binding and replies through the foreign agent.
//!
//! All preconditions are checked before the first table is touched, so a
//! rejected registration leaves every agent unchanged.

use crate::address::Address;
use crate::binding::BindingEntry;
use crate::error::RegistrationError;
use crate::message::{RegistrationMessage, RegistrationReply, RegistrationRequest};
use crate::node::{ForeignAgent, HomeAgent, MobileNode};
use crate::visitor::VisitorEntry;
use serde::{Deserialize, Serialize};

/// Caller-chosen values for one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationParams {
    /// Lifetime the node asks for, in seconds
    pub requested_lifetime_secs: u32,
    /// Id linking the reply to the request
    pub correlation_id: u64,
}

/// One registration message in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationHop {
    pub from: Address,
    pub to: Address,
    pub message: RegistrationMessage,
    /// Set when the foreign agent relays the request to the home agent
    pub encapsulated: bool,
}

/// Result of a completed registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub request: RegistrationRequest,
    pub reply: RegistrationReply,
    /// The four hops, in order: MN->FA, FA->HA, HA->FA, FA->MN
    pub hops: Vec<RegistrationHop>,
    /// Entry written to the home agent's binding table
    pub binding: BindingEntry,
    /// Entry written to the foreign agent's visitor list
    pub visitor: VisitorEntry,
}

impl RegistrationOutcome {
    /// Lifetime granted by the home agent
    pub fn granted_lifetime_secs(&self) -> u32 {
        self.reply.lifetime_secs
    }
}

/// Builds the request `node` would send through `foreign_agent` and checks
/// that both agents will accept it
///
/// Does not look at where the node is attached; handoff uses this before
/// it moves the node.
pub fn prepare_request(
    node: &MobileNode,
    home_agent: &HomeAgent,
    foreign_agent: &ForeignAgent,
    params: RegistrationParams,
) -> Result<RegistrationRequest, RegistrationError> {
    let request = RegistrationRequest {
        care_of_address: foreign_agent.address().clone(),
        home_agent: node.home_agent().clone(),
        mobile_node: node.address().clone(),
        lifetime_secs: params.requested_lifetime_secs,
        correlation_id: params.correlation_id,
    };

    foreign_agent.check_request(&request)?;
    home_agent.check_request(&request)?;
    Ok(request)
}

/// Registers a visiting `node` with its home agent through `foreign_agent`
pub fn register(
    node: &mut MobileNode,
    home_agent: &mut HomeAgent,
    foreign_agent: &mut ForeignAgent,
    params: RegistrationParams,
) -> Result<RegistrationOutcome, RegistrationError> {
    if node.is_at_home() {
        log::warn!(
            "Registration refused: mobile node {} is at home",
            node.address()
        );
        return Err(RegistrationError::NodeAtHome(node.address().clone()));
    }

    let request = prepare_request(node, home_agent, foreign_agent, params).inspect_err(|e| {
        log::warn!("Registration refused: {}", e);
    })?;

    let node_addr = node.address().clone();
    let fa_addr = foreign_agent.address().clone();
    let ha_addr = home_agent.address().clone();
    let mut hops = Vec::with_capacity(4);

    // Request
    node.attach_foreign(fa_addr.clone());
    log::info!(
        "Mobile node {}: sending registration request to foreign agent {}",
        node_addr,
        fa_addr
    );
    hops.push(RegistrationHop {
        from: node_addr.clone(),
        to: fa_addr.clone(),
        message: RegistrationMessage::Request(request.clone()),
        encapsulated: false,
    });

    // Visit recording
    let visitor = foreign_agent.record_visit(&request, node.link_address())?;
    log::info!(
        "Foreign agent {}: visitor list updated for {}",
        fa_addr,
        node_addr
    );

    // Forward
    log::info!(
        "Foreign agent {}: relaying registration request to home agent {}",
        fa_addr,
        ha_addr
    );
    hops.push(RegistrationHop {
        from: fa_addr.clone(),
        to: ha_addr.clone(),
        message: RegistrationMessage::Request(request.clone()),
        encapsulated: true,
    });

    // Binding update and reply
    let (binding, reply) = home_agent.process_request(&request)?;
    log::info!(
        "Home agent {}: bound {} to {} for {}s",
        ha_addr,
        binding.home_address,
        binding.care_of_address,
        binding.lifetime_secs
    );
    hops.push(RegistrationHop {
        from: ha_addr.clone(),
        to: fa_addr.clone(),
        message: RegistrationMessage::Reply(reply.clone()),
        encapsulated: false,
    });

    // Relay
    let reply = foreign_agent.relay_reply(reply)?;
    log::info!(
        "Foreign agent {}: relaying registration reply to mobile node {}",
        fa_addr,
        node_addr
    );
    hops.push(RegistrationHop {
        from: fa_addr,
        to: node_addr,
        message: RegistrationMessage::Reply(reply.clone()),
        encapsulated: false,
    });

    Ok(RegistrationOutcome {
        request,
        reply,
        hops,
        binding,
        visitor,
    })
}
