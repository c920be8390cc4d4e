// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Structured message trace
//!
//! Every message, table update and state change of a session is recorded
//! as a [`TraceEvent`]. The trace is what gets printed and exported; the
//! protocol functions never print anything themselves.

use crate::address::Address;
use crate::binding::BindingEntry;
use crate::discovery::DiscoveryOutcome;
use crate::message::{Datagram, DiscoveryMessage};
use crate::registration::{RegistrationHop, RegistrationOutcome};
use crate::routing::{AnchorNotice, BindingQuery, Delivery, HandoffOutcome, Hop};
use crate::visitor::VisitorEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    /// A discovery message sent on the node's link
    Discovery {
        node: Address,
        message: DiscoveryMessage,
    },
    /// A registration message crossing one hop
    Registration(RegistrationHop),
    /// A home agent wrote a binding
    BindingUpdated {
        home_agent: Address,
        entry: BindingEntry,
    },
    /// A foreign agent wrote a visitor entry
    VisitorRecorded {
        foreign_agent: Address,
        entry: VisitorEntry,
    },
    /// A correspondent asked the home agent for a care-of-address
    BindingQuery(BindingQuery),
    /// A datagram crossing one hop
    Hop(Hop),
    /// The mobile node accepted a datagram
    Delivered {
        node: Address,
        datagram: Datagram,
        unwraps: usize,
    },
    /// A new foreign agent told the anchor where the node went
    AnchorNotified(AnchorNotice),
    /// The session moved between states
    StateChanged { from: String, to: String },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Discovery { node, message } => match message {
                DiscoveryMessage::Solicitation(s) => {
                    write!(f, "{} -> *: {}", s.solicitor, message.kind())
                }
                DiscoveryMessage::Advertisement(a) => write!(
                    f,
                    "{} -> {}: {} (H={}, F={}, R={}, coa={})",
                    a.advertiser,
                    node,
                    message.kind(),
                    u8::from(a.home_agent),
                    u8::from(a.foreign_agent),
                    u8::from(a.registration_required),
                    a.care_of_addresses
                        .front()
                        .map_or("N/A", |coa| coa.as_str())
                ),
            },
            TraceEvent::Registration(hop) => {
                write!(f, "{} -> {}: {}", hop.from, hop.to, hop.message)?;
                if hop.encapsulated {
                    write!(f, " [encapsulated]")?;
                }
                Ok(())
            }
            TraceEvent::BindingUpdated { home_agent, entry } => write!(
                f,
                "{}: binding {} -> {} ({}s)",
                home_agent, entry.home_address, entry.care_of_address, entry.lifetime_secs
            ),
            TraceEvent::VisitorRecorded {
                foreign_agent,
                entry,
            } => write!(
                f,
                "{}: visitor {} via {} at {} ({}s)",
                foreign_agent,
                entry.home_address,
                entry.home_agent_address,
                entry.link_address,
                entry.lifetime_secs
            ),
            TraceEvent::BindingQuery(q) => write!(
                f,
                "{} -> {}: where is {}? ({})",
                q.correspondent, q.home_agent, q.home_address, q.care_of_address
            ),
            TraceEvent::Hop(hop) => write!(f, "{} -> {}: {}", hop.from, hop.to, hop.packet),
            TraceEvent::Delivered {
                node,
                datagram,
                unwraps,
            } => write!(
                f,
                "{}: received {} after {} unwrap(s)",
                node, datagram, unwraps
            ),
            TraceEvent::AnchorNotified(n) => write!(
                f,
                "{} -> {}: {} now at {}",
                n.from, n.anchor, n.home_address, n.care_of_address
            ),
            TraceEvent::StateChanged { from, to } => write!(f, "state: {} => {}", from, to),
        }
    }
}

/// Ordered log of a session's events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Data-path hops across the whole trace
    pub fn hops(&self) -> impl Iterator<Item = &Hop> {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::Hop(hop) => Some(hop),
            _ => None,
        })
    }

    pub fn record_discovery(&mut self, node: &Address, outcome: &DiscoveryOutcome) {
        if let Some(solicitation) = &outcome.solicitation {
            self.push(TraceEvent::Discovery {
                node: node.clone(),
                message: solicitation.clone(),
            });
        }
        self.push(TraceEvent::Discovery {
            node: node.clone(),
            message: outcome.advertisement.clone(),
        });
    }

    /// Records the four hops with the table writes where they happened
    pub fn record_registration(&mut self, outcome: &RegistrationOutcome) {
        for (idx, hop) in outcome.hops.iter().enumerate() {
            self.push(TraceEvent::Registration(hop.clone()));
            match idx {
                0 => self.push(TraceEvent::VisitorRecorded {
                    foreign_agent: hop.to.clone(),
                    entry: outcome.visitor.clone(),
                }),
                1 => self.push(TraceEvent::BindingUpdated {
                    home_agent: hop.to.clone(),
                    entry: outcome.binding.clone(),
                }),
                _ => {}
            }
        }
    }

    pub fn record_delivery(&mut self, delivery: &Delivery) {
        if let Some(query) = &delivery.query {
            self.push(TraceEvent::BindingQuery(query.clone()));
        }
        for hop in &delivery.hops {
            self.push(TraceEvent::Hop(hop.clone()));
        }
        self.push(TraceEvent::Delivered {
            node: delivery.received.destination.clone(),
            datagram: delivery.received.clone(),
            unwraps: delivery.unwraps,
        });
    }

    pub fn record_handoff(&mut self, node: &Address, outcome: &HandoffOutcome) {
        self.record_discovery(node, &outcome.discovery);
        self.record_registration(&outcome.registration);
        self.push(TraceEvent::AnchorNotified(outcome.notice.clone()));
    }

    pub fn record_transition(&mut self, from: impl ToString, to: impl ToString) {
        self.push(TraceEvent::StateChanged {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, event) in self.events.iter().enumerate() {
            writeln!(f, "{:>3}. {}", idx + 1, event)?;
        }
        Ok(())
    }
}
