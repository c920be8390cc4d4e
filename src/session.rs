// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Mobility session
//!
//! Owns the mobile node, its home agent, the foreign agents it may visit
//! and one correspondent, and drives them through the session lifecycle:
//!
//! ```text
//! Home -> discover -> ForeignUnregistered -> register -> ForeignRegistered
//!      -> route (direct) -> HandoffPending -> handoff -> ForeignRegistered
//! ```
//!
//! Operations that are not allowed in the current state fail without
//! touching any node.

use crate::address::Address;
use crate::discovery::{DiscoveryMethod, DiscoveryOutcome, Network, discover};
use crate::error::{DiscoveryError, MipError, RegistrationError, RoutingError, SessionError};
use crate::node::{CorrespondentNode, ForeignAgent, HomeAgent, MobileNode};
use crate::registration::{self, RegistrationOutcome, RegistrationParams};
use crate::routing::{self, Delivery, HandoffOutcome, RoutingMethod};
use crate::trace::Trace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Attached to the home network
    Home,
    /// Discovered a foreign agent, not yet registered through it
    ForeignUnregistered { foreign_agent: usize },
    /// Registered through a foreign agent, optionally relayed by an anchor
    ForeignRegistered {
        foreign_agent: usize,
        anchor: Option<usize>,
    },
    /// Direct delivery happened; the node is about to move on
    HandoffPending { anchor: usize },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Home => write!(f, "home"),
            SessionState::ForeignUnregistered { foreign_agent } => {
                write!(f, "foreign-unregistered (fa #{})", foreign_agent)
            }
            SessionState::ForeignRegistered {
                foreign_agent,
                anchor: None,
            } => write!(f, "foreign-registered (fa #{})", foreign_agent),
            SessionState::ForeignRegistered {
                foreign_agent,
                anchor: Some(anchor),
            } => write!(
                f,
                "foreign-registered (fa #{}, anchor #{})",
                foreign_agent, anchor
            ),
            SessionState::HandoffPending { anchor } => {
                write!(f, "handoff-pending (anchor #{})", anchor)
            }
        }
    }
}

/// One mobile node and the agents it interacts with
#[derive(Debug)]
pub struct Session {
    node: MobileNode,
    home_agent: HomeAgent,
    foreign_agents: Vec<ForeignAgent>,
    correspondent: CorrespondentNode,
    state: SessionState,
    trace: Trace,
}

impl Session {
    /// Creates a session with the node at home
    pub fn new(
        node: MobileNode,
        home_agent: HomeAgent,
        foreign_agents: Vec<ForeignAgent>,
        correspondent: CorrespondentNode,
    ) -> Self {
        Self {
            node,
            home_agent,
            foreign_agents,
            correspondent,
            state: SessionState::Home,
            trace: Trace::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn node(&self) -> &MobileNode {
        &self.node
    }

    pub fn home_agent(&self) -> &HomeAgent {
        &self.home_agent
    }

    pub fn foreign_agents(&self) -> &[ForeignAgent] {
        &self.foreign_agents
    }

    pub fn correspondent(&self) -> &CorrespondentNode {
        &self.correspondent
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn into_trace(self) -> Trace {
        self.trace
    }

    /// Runs discovery on the home network
    pub fn discover_home(&mut self, method: DiscoveryMethod) -> DiscoveryOutcome {
        let outcome = discover(&mut self.node, Network::Home(&self.home_agent), method);
        self.trace.record_discovery(self.node.address(), &outcome);
        self.transition(SessionState::Home);
        outcome
    }

    /// Runs discovery on the network of foreign agent `index`
    pub fn discover_foreign(
        &mut self,
        index: usize,
        method: DiscoveryMethod,
    ) -> Result<DiscoveryOutcome, MipError> {
        if let SessionState::HandoffPending { .. } = self.state {
            return Err(self.invalid("discover a foreign agent"));
        }
        self.check_index(index)?;

        let outcome = discover(
            &mut self.node,
            Network::Foreign(&self.foreign_agents[index]),
            method,
        );
        self.trace.record_discovery(self.node.address(), &outcome);
        self.transition(SessionState::ForeignUnregistered {
            foreign_agent: index,
        });
        Ok(outcome)
    }

    /// Registers through the current foreign agent
    ///
    /// Registering again while registered renews the binding and keeps the
    /// anchor.
    pub fn register(
        &mut self,
        params: RegistrationParams,
    ) -> Result<RegistrationOutcome, MipError> {
        let (index, anchor) = match self.state {
            SessionState::Home => {
                log::warn!(
                    "Registration refused: mobile node {} is at home",
                    self.node.address()
                );
                return Err(RegistrationError::NodeAtHome(self.node.address().clone()).into());
            }
            SessionState::HandoffPending { .. } => return Err(self.invalid("register")),
            SessionState::ForeignUnregistered { foreign_agent } => (foreign_agent, None),
            SessionState::ForeignRegistered {
                foreign_agent,
                anchor,
            } => (foreign_agent, anchor),
        };

        let outcome = registration::register(
            &mut self.node,
            &mut self.home_agent,
            &mut self.foreign_agents[index],
            params,
        )?;
        self.trace.record_registration(&outcome);
        self.transition(SessionState::ForeignRegistered {
            foreign_agent: index,
            anchor,
        });
        Ok(outcome)
    }

    /// Sends datagram `sequence_id` from the correspondent to the node
    ///
    /// The first direct delivery leaves the session waiting for a handoff;
    /// once anchored, direct deliveries go through the anchor.
    pub fn route(
        &mut self,
        method: RoutingMethod,
        sequence_id: u64,
    ) -> Result<Delivery, MipError> {
        let SessionState::ForeignRegistered {
            foreign_agent,
            anchor,
        } = self.state
        else {
            return Err(self.invalid("route"));
        };

        let previous_anchor = self
            .correspondent
            .anchor_for(self.node.address())
            .ok()
            .cloned();
        let datagram = self
            .correspondent
            .datagram_to(self.node.address(), sequence_id);
        let delivery = match (method, anchor) {
            (RoutingMethod::Indirect, _) => routing::deliver_indirect(
                datagram,
                &self.home_agent,
                &self.foreign_agents[foreign_agent],
                &mut self.node,
            ),
            (RoutingMethod::Direct, None) => routing::deliver_direct(
                datagram,
                &mut self.correspondent,
                &self.home_agent,
                &self.foreign_agents[foreign_agent],
                &mut self.node,
            ),
            (RoutingMethod::Direct, Some(anchor)) => routing::deliver_via_anchor(
                datagram,
                &self.correspondent,
                &self.foreign_agents[anchor],
                &self.foreign_agents[foreign_agent],
                &mut self.node,
            ),
        }
        .inspect_err(|e| log::warn!("Delivery of datagram #{} failed: {}", sequence_id, e))?;

        self.trace.record_delivery(&delivery);
        if let (RoutingMethod::Direct, None) = (method, anchor) {
            if let Some(old) = previous_anchor {
                self.release_anchor(&old);
            }
            let anchor = self.anchor_index()?;
            self.transition(SessionState::HandoffPending { anchor });
        }
        Ok(delivery)
    }

    /// Moves the node from its anchor to foreign agent `index`
    pub fn handoff(
        &mut self,
        index: usize,
        method: DiscoveryMethod,
        params: RegistrationParams,
    ) -> Result<HandoffOutcome, MipError> {
        let SessionState::HandoffPending { anchor } = self.state else {
            return Err(self.invalid("hand off"));
        };
        self.check_index(index)?;

        let (anchor_fa, new_fa) = pair_mut(&mut self.foreign_agents, anchor, index)?;
        let outcome = routing::handoff(
            &mut self.node,
            &mut self.home_agent,
            anchor_fa,
            new_fa,
            method,
            params,
        )?;
        self.trace.record_handoff(self.node.address(), &outcome);
        self.transition(SessionState::ForeignRegistered {
            foreign_agent: index,
            anchor: Some(anchor),
        });
        Ok(outcome)
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::info!("Session: {} => {}", self.state, next);
            self.trace.record_transition(self.state, next);
            self.state = next;
        }
    }

    /// Index of the foreign agent the correspondent tunnels to
    fn anchor_index(&self) -> Result<usize, RoutingError> {
        let anchor = self.correspondent.anchor_for(self.node.address())?;
        self.foreign_agents
            .iter()
            .position(|fa| fa.address() == anchor)
            .ok_or_else(|| RoutingError::NoAnchor {
                correspondent: self.correspondent.address().clone(),
                home_address: self.node.address().clone(),
            })
    }

    /// Stops a replaced anchor from forwarding the node's traffic
    fn release_anchor(&mut self, old: &Address) {
        let home = self.node.address();
        for fa in self.foreign_agents.iter_mut() {
            if fa.address() == old {
                fa.clear_forwarding(home);
            }
        }
    }

    fn check_index(&self, index: usize) -> Result<(), DiscoveryError> {
        if index >= self.foreign_agents.len() {
            return Err(DiscoveryError::UnknownForeignAgent {
                index,
                count: self.foreign_agents.len(),
            });
        }
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> MipError {
        log::warn!("Session: cannot {} while {}", operation, self.state);
        SessionError::InvalidTransition {
            operation,
            state: self.state.to_string(),
        }
        .into()
    }
}

/// Borrows two distinct foreign agents mutably
fn pair_mut(
    agents: &mut [ForeignAgent],
    first: usize,
    second: usize,
) -> Result<(&mut ForeignAgent, &mut ForeignAgent), RoutingError> {
    if first == second {
        return Err(RoutingError::SameForeignAgent(
            agents[first].address().clone(),
        ));
    }
    if first < second {
        let (left, right) = agents.split_at_mut(second);
        Ok((&mut left[first], &mut right[0]))
    } else {
        let (left, right) = agents.split_at_mut(first);
        Ok((&mut right[0], &mut left[second]))
    }
}
