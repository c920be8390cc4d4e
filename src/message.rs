// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Protocol message definitions
//!
//! Immutable values exchanged between the mobile node, the agents and the
//! correspondent: agent discovery messages, registration messages and
//! (possibly tunneled) datagrams.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Agent discovery message (ICMP router discovery analog)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryMessage {
    /// Broadcast by an agent, offering care-of-addresses
    Advertisement(AgentAdvertisement),
    /// Broadcast by a mobile node asking agents to advertise
    Solicitation(AgentSolicitation),
}

impl DiscoveryMessage {
    /// Short kind label for logs and tables
    pub fn kind(&self) -> &'static str {
        match self {
            DiscoveryMessage::Advertisement(_) => "ADVERTISEMENT",
            DiscoveryMessage::Solicitation(_) => "SOLICITATION",
        }
    }
}

/// Agent advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAdvertisement {
    /// Address of the advertising agent
    pub advertiser: Address,
    /// H flag: the advertiser is a home agent on this link
    pub home_agent: bool,
    /// F flag: the advertiser is a foreign agent on this link
    pub foreign_agent: bool,
    /// R flag: registration with this foreign agent is required
    pub registration_required: bool,
    /// Offered care-of-addresses, consumed in order
    pub care_of_addresses: VecDeque<Address>,
}

impl AgentAdvertisement {
    /// Takes the next offered care-of-address
    pub fn take_care_of_address(&mut self) -> Option<Address> {
        self.care_of_addresses.pop_front()
    }
}

/// Agent solicitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSolicitation {
    /// Address of the soliciting mobile node
    pub solicitor: Address,
}

/// Registration message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationMessage {
    Request(RegistrationRequest),
    Reply(RegistrationReply),
}

impl RegistrationMessage {
    pub fn correlation_id(&self) -> u64 {
        match self {
            RegistrationMessage::Request(r) => r.correlation_id,
            RegistrationMessage::Reply(r) => r.correlation_id,
        }
    }

    pub fn home_agent(&self) -> &Address {
        match self {
            RegistrationMessage::Request(r) => &r.home_agent,
            RegistrationMessage::Reply(r) => &r.home_agent,
        }
    }

    pub fn mobile_node(&self) -> &Address {
        match self {
            RegistrationMessage::Request(r) => &r.mobile_node,
            RegistrationMessage::Reply(r) => &r.mobile_node,
        }
    }

    pub fn lifetime_secs(&self) -> u32 {
        match self {
            RegistrationMessage::Request(r) => r.lifetime_secs,
            RegistrationMessage::Reply(r) => r.lifetime_secs,
        }
    }

    /// The care-of-address being registered; replies carry none
    pub fn care_of_address(&self) -> Option<&Address> {
        match self {
            RegistrationMessage::Request(r) => Some(&r.care_of_address),
            RegistrationMessage::Reply(_) => None,
        }
    }
}

impl fmt::Display for RegistrationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationMessage::Request(r) => write!(
                f,
                "REQUEST(coa={}, ha={}, mn={}, lifetime={}s, id={})",
                r.care_of_address, r.home_agent, r.mobile_node, r.lifetime_secs, r.correlation_id
            ),
            RegistrationMessage::Reply(r) => write!(
                f,
                "REPLY(ha={}, mn={}, lifetime={}s, id={})",
                r.home_agent, r.mobile_node, r.lifetime_secs, r.correlation_id
            ),
        }
    }
}

/// Registration request, sent by the mobile node via its foreign agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub care_of_address: Address,
    pub home_agent: Address,
    pub mobile_node: Address,
    /// Requested lifetime in seconds
    pub lifetime_secs: u32,
    pub correlation_id: u64,
}

/// Registration reply, sent by the home agent via the foreign agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReply {
    pub home_agent: Address,
    pub mobile_node: Address,
    /// Granted lifetime in seconds
    pub lifetime_secs: u32,
    /// Echo of the request's correlation id
    pub correlation_id: u64,
}

impl RegistrationReply {
    /// Builds the reply answering `request` with the granted lifetime
    pub fn answering(request: &RegistrationRequest, granted_lifetime_secs: u32) -> Self {
        Self {
            home_agent: request.home_agent.clone(),
            mobile_node: request.mobile_node.clone(),
            lifetime_secs: granted_lifetime_secs,
            correlation_id: request.correlation_id,
        }
    }
}

/// A network-layer datagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datagram {
    pub source: Address,
    pub destination: Address,
    pub sequence_id: u64,
}

impl Datagram {
    pub fn new(source: Address, destination: Address, sequence_id: u64) -> Self {
        Self {
            source,
            destination,
            sequence_id,
        }
    }

    /// Wraps this datagram in a tunnel from `outer_source` to `outer_destination`
    pub fn encapsulate(self, outer_source: Address, outer_destination: Address) -> Envelope {
        Envelope {
            outer_source,
            outer_destination,
            inner: self,
        }
    }
}

impl fmt::Display for Datagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} -> {} #{}]",
            self.source, self.destination, self.sequence_id
        )
    }
}

/// An IP-in-IP tunnel envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Tunnel entry point
    pub outer_source: Address,
    /// Tunnel exit point
    pub outer_destination: Address,
    /// The carried datagram, untouched by tunneling
    pub inner: Datagram,
}

impl Envelope {
    /// Strips the outer header
    pub fn decapsulate(self) -> Datagram {
        self.inner
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} => {}>{}",
            self.outer_source, self.outer_destination, self.inner
        )
    }
}

/// What travels over a single hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    Plain(Datagram),
    Tunneled(Envelope),
}

impl Packet {
    /// The address this hop is routed to
    pub fn routed_destination(&self) -> &Address {
        match self {
            Packet::Plain(d) => &d.destination,
            Packet::Tunneled(e) => &e.outer_destination,
        }
    }

    pub fn is_tunneled(&self) -> bool {
        matches!(self, Packet::Tunneled(_))
    }

    /// The datagram carried, whether tunneled or not
    pub fn datagram(&self) -> &Datagram {
        match self {
            Packet::Plain(d) => d,
            Packet::Tunneled(e) => &e.inner,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Plain(d) => d.fmt(f),
            Packet::Tunneled(e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            care_of_address: Address::from("20.0.0.1"),
            home_agent: Address::from("10.0.0.1"),
            mobile_node: Address::from("10.0.0.5"),
            lifetime_secs: 30,
            correlation_id: 77,
        }
    }

    #[test]
    fn test_reply_echoes_correlation_id() {
        let reply = RegistrationReply::answering(&request(), 20);
        assert_eq!(reply.correlation_id, 77);
        assert_eq!(reply.lifetime_secs, 20);
        assert_eq!(reply.mobile_node, Address::from("10.0.0.5"));
    }

    #[test]
    fn test_reply_has_no_care_of_address() {
        let req = RegistrationMessage::Request(request());
        let reply = RegistrationMessage::Reply(RegistrationReply::answering(&request(), 30));

        assert_eq!(req.care_of_address(), Some(&Address::from("20.0.0.1")));
        assert_eq!(reply.care_of_address(), None);
        assert_eq!(req.correlation_id(), reply.correlation_id());
    }

    #[test]
    fn test_decapsulation_is_structural() {
        let datagram = Datagram::new(Address::from("30.0.0.9"), Address::from("10.0.0.5"), 7);
        let envelope = datagram
            .clone()
            .encapsulate(Address::from("10.0.0.1"), Address::from("20.0.0.1"));

        let packet = Packet::Tunneled(envelope.clone());
        assert!(packet.is_tunneled());
        assert_eq!(packet.routed_destination(), &Address::from("20.0.0.1"));
        assert_eq!(packet.datagram(), &datagram);
        assert_eq!(envelope.decapsulate(), datagram);
    }

    #[test]
    fn test_advertisement_offers_are_consumed_in_order() {
        let mut adv = AgentAdvertisement {
            advertiser: Address::from("20.0.0.1"),
            home_agent: false,
            foreign_agent: true,
            registration_required: true,
            care_of_addresses: VecDeque::from(vec![
                Address::from("20.0.0.1"),
                Address::from("20.0.0.99"),
            ]),
        };
        assert_eq!(adv.take_care_of_address(), Some(Address::from("20.0.0.1")));
        assert_eq!(adv.take_care_of_address(), Some(Address::from("20.0.0.99")));
        assert_eq!(adv.take_care_of_address(), None);
    }

    #[test]
    fn test_message_display() {
        let msg = RegistrationMessage::Request(request());
        assert_eq!(
            msg.to_string(),
            "REQUEST(coa=20.0.0.1, ha=10.0.0.1, mn=10.0.0.5, lifetime=30s, id=77)"
        );
    }
}
