// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Integration tests for indirect and direct datagram delivery

use mipsim::{
    Address, CorrespondentNode, Datagram, DiscoveryMethod, ForeignAgent, HomeAgent, LinkAddress,
    MobileNode, Network, Packet, RegistrationParams, RoutingError, deliver_direct,
    deliver_indirect, discover, register,
};

struct World {
    node: MobileNode,
    ha: HomeAgent,
    f1: ForeignAgent,
    f2: ForeignAgent,
    cn: CorrespondentNode,
}

fn world() -> World {
    World {
        node: MobileNode::new(
            Address::from("10.0.0.5"),
            LinkAddress::from("aa:bb:cc:dd:ee:ff"),
            Address::from("10.0.0.1"),
        ),
        ha: HomeAgent::new(Address::from("10.0.0.1")),
        f1: ForeignAgent::new(Address::from("20.0.0.1")),
        f2: ForeignAgent::new(Address::from("20.0.0.2")),
        cn: CorrespondentNode::new(Address::from("30.0.0.9")),
    }
}

fn params(correlation_id: u64) -> RegistrationParams {
    RegistrationParams {
        requested_lifetime_secs: 30,
        correlation_id,
    }
}

fn registered_with_f1() -> World {
    let mut w = world();
    discover(&mut w.node, Network::Foreign(&w.f1), DiscoveryMethod::Advertisement);
    register(&mut w.node, &mut w.ha, &mut w.f1, params(1)).unwrap();
    w
}

#[test]
fn test_indirect_delivery_of_datagram_7() {
    println!("\n=== Indirect delivery of datagram #7 ===\n");
    let mut w = registered_with_f1();

    let sent = w.cn.datagram_to(&Address::from("10.0.0.5"), 7);
    let delivery = deliver_indirect(sent.clone(), &w.ha, &w.f1, &mut w.node).unwrap();

    assert_eq!(delivery.received.source, Address::from("30.0.0.9"));
    assert_eq!(delivery.received.destination, Address::from("10.0.0.5"));
    assert_eq!(delivery.received.sequence_id, 7);
    assert_eq!(delivery.received, sent);
    println!("✓ Node received {} unchanged", delivery.received);

    match &delivery.hops[1].packet {
        Packet::Tunneled(envelope) => {
            assert_eq!(envelope.outer_source, Address::from("10.0.0.1"));
            assert_eq!(envelope.outer_destination, Address::from("20.0.0.1"));
            assert_eq!(envelope.inner, sent);
        }
        other => panic!("expected tunneled hop, got {}", other),
    }
}

#[test]
fn test_indirect_delivery_preserves_every_datagram() {
    let mut w = registered_with_f1();

    for seq in [0u64, 1, 7, 1 << 40, u64::MAX] {
        let sent = Datagram::new(Address::from("30.0.0.9"), Address::from("10.0.0.5"), seq);
        let delivery = deliver_indirect(sent.clone(), &w.ha, &w.f1, &mut w.node).unwrap();
        assert_eq!(delivery.received, sent);
        assert_eq!(delivery.unwraps, 1);
    }
    assert_eq!(w.node.received().len(), 5);
}

#[test]
fn test_stale_foreign_agent_is_not_used_after_reregistration() {
    let mut w = registered_with_f1();
    discover(&mut w.node, Network::Foreign(&w.f2), DiscoveryMethod::Advertisement);
    register(&mut w.node, &mut w.ha, &mut w.f2, params(2)).unwrap();
    assert_eq!(w.ha.bindings().len(), 1);

    let sent = w.cn.datagram_to(w.node.address(), 7);

    // F1 still lists the node as a visitor but is no longer the tunnel end
    assert!(w.f1.has_visitor(w.node.address()));
    let err = deliver_indirect(sent.clone(), &w.ha, &w.f1, &mut w.node).unwrap_err();
    assert_eq!(
        err,
        RoutingError::MisdirectedTunnel {
            outer_destination: Address::from("20.0.0.2"),
            foreign_agent: Address::from("20.0.0.1"),
        }
    );
    assert!(w.node.received().is_empty());

    let delivery = deliver_indirect(sent.clone(), &w.ha, &w.f2, &mut w.node).unwrap();
    assert_eq!(delivery.hops[1].to, Address::from("20.0.0.2"));
    assert_eq!(delivery.received, sent);
    println!("✓ Stale route through 20.0.0.1 refused");
}

#[test]
fn test_routing_without_registration_fails() {
    let mut w = world();
    discover(&mut w.node, Network::Foreign(&w.f1), DiscoveryMethod::Advertisement);
    let sent = w.cn.datagram_to(w.node.address(), 1);

    let err = deliver_indirect(sent.clone(), &w.ha, &w.f1, &mut w.node).unwrap_err();
    assert!(matches!(err, RoutingError::NoBinding { .. }));

    let err = deliver_direct(sent, &mut w.cn, &w.ha, &w.f1, &mut w.node).unwrap_err();
    assert!(matches!(err, RoutingError::NoBinding { .. }));
    assert!(w.cn.anchor_for(w.node.address()).is_err());
    assert!(w.node.received().is_empty());
}

#[test]
fn test_foreign_agent_without_visitor_entry_refuses_tunnel() {
    let mut w = world();
    // A binding exists at the home agent, but 20.0.0.1 never saw the request
    let mut stray_fa = ForeignAgent::new(Address::from("20.0.0.1"));
    discover(&mut w.node, Network::Foreign(&stray_fa), DiscoveryMethod::Advertisement);
    register(&mut w.node, &mut w.ha, &mut stray_fa, params(1)).unwrap();

    let sent = w.cn.datagram_to(w.node.address(), 3);
    let err = deliver_indirect(sent, &w.ha, &w.f1, &mut w.node).unwrap_err();
    assert!(matches!(err, RoutingError::NoVisitorEntry { .. }));
}

#[test]
fn test_datagram_for_another_node_is_refused() {
    let mut w = registered_with_f1();
    let stray = w.cn.datagram_to(&Address::from("10.0.0.99"), 1);

    let err = deliver_indirect(stray, &w.ha, &w.f1, &mut w.node).unwrap_err();
    assert!(matches!(err, RoutingError::NotAddressedToNode { .. }));
}

#[test]
fn test_direct_path_never_targets_home_agent() {
    let mut w = registered_with_f1();
    let sent = w.cn.datagram_to(w.node.address(), 11);

    let delivery = deliver_direct(sent.clone(), &mut w.cn, &w.ha, &w.f1, &mut w.node).unwrap();

    for hop in &delivery.hops {
        assert_ne!(hop.to, *w.ha.address());
        assert_ne!(hop.packet.routed_destination(), w.ha.address());
    }
    let query = delivery.query.as_ref().unwrap();
    assert_eq!(query.home_agent, *w.ha.address());
    assert_eq!(delivery.received, sent);
    println!("✓ Home agent only answered the care-of-address query");
}
