// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Integration tests for handoff and delivery through the anchor foreign agent

use mipsim::{
    Address, CorrespondentNode, DiscoveryMethod, ForeignAgent, HomeAgent, LinkAddress, MipError,
    MobileNode, RegistrationParams, RoutingMethod, Session, SessionError, SessionState,
    TraceEvent,
};

fn session() -> Session {
    Session::new(
        MobileNode::new(
            Address::from("10.0.0.5"),
            LinkAddress::from("aa:bb:cc:dd:ee:ff"),
            Address::from("10.0.0.1"),
        ),
        HomeAgent::new(Address::from("10.0.0.1")),
        vec![
            ForeignAgent::new(Address::from("20.0.0.1")),
            ForeignAgent::new(Address::from("20.0.0.2")),
        ],
        CorrespondentNode::new(Address::from("30.0.0.9")),
    )
}

fn params(correlation_id: u64) -> RegistrationParams {
    RegistrationParams {
        requested_lifetime_secs: 30,
        correlation_id,
    }
}

fn handed_off() -> Session {
    let mut s = session();
    s.discover_foreign(0, DiscoveryMethod::Advertisement).unwrap();
    s.register(params(100)).unwrap();
    s.route(RoutingMethod::Direct, 7).unwrap();
    s.handoff(1, DiscoveryMethod::Advertisement, params(101))
        .unwrap();
    s
}

#[test]
fn test_anchor_relays_to_new_care_of_address() {
    println!("\n=== Handoff from 20.0.0.1 to 20.0.0.2 ===\n");
    let mut s = handed_off();

    let anchor = &s.foreign_agents()[0];
    assert_eq!(
        anchor.forwarding_address(&Address::from("10.0.0.5")),
        Some(&Address::from("20.0.0.2"))
    );
    assert_eq!(
        s.home_agent()
            .care_of_address(&Address::from("10.0.0.5"))
            .unwrap(),
        &Address::from("20.0.0.2")
    );
    println!("✓ Anchor 20.0.0.1 forwards to 20.0.0.2");

    let delivery = s.route(RoutingMethod::Direct, 8).unwrap();

    assert_eq!(delivery.received.sequence_id, 8);
    assert_eq!(delivery.received.source, Address::from("30.0.0.9"));
    assert_eq!(delivery.unwraps, 2);

    let route: Vec<(&str, &str, bool)> = delivery
        .hops
        .iter()
        .map(|h| (h.from.as_str(), h.to.as_str(), h.packet.is_tunneled()))
        .collect();
    assert_eq!(
        route,
        vec![
            ("30.0.0.9", "20.0.0.1", true),
            ("20.0.0.1", "20.0.0.2", true),
            ("20.0.0.2", "10.0.0.5", false),
        ]
    );

    // The anchor is never where the datagram ends up
    let last = delivery.final_hop().unwrap();
    assert_ne!(last.to, Address::from("20.0.0.1"));
    assert_ne!(last.packet.routed_destination(), &Address::from("20.0.0.1"));
    println!("✓ Datagram #8 reached the node through the anchor");
}

#[test]
fn test_handoff_trace_records_notice_and_registration() {
    let s = handed_off();

    let notices: Vec<_> = s
        .trace()
        .events()
        .iter()
        .filter_map(|e| match e {
            TraceEvent::AnchorNotified(notice) => Some(notice),
            _ => None,
        })
        .collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].from, Address::from("20.0.0.2"));
    assert_eq!(notices[0].anchor, Address::from("20.0.0.1"));

    let registrations = s
        .trace()
        .events()
        .iter()
        .filter(|e| matches!(e, TraceEvent::Registration(_)))
        .count();
    assert_eq!(registrations, 8);
}

#[test]
fn test_handoff_only_after_direct_delivery() {
    let mut s = session();
    s.discover_foreign(0, DiscoveryMethod::Advertisement).unwrap();
    s.register(params(1)).unwrap();
    s.route(RoutingMethod::Indirect, 7).unwrap();

    let err = s
        .handoff(1, DiscoveryMethod::Advertisement, params(2))
        .unwrap_err();
    assert!(matches!(
        err,
        MipError::Session(SessionError::InvalidTransition { .. })
    ));
    assert!(s.foreign_agents()[1].visitors().is_empty());
    assert_eq!(
        s.state(),
        SessionState::ForeignRegistered {
            foreign_agent: 0,
            anchor: None,
        }
    );
}

#[test]
fn test_register_while_handoff_pending_is_invalid() {
    let mut s = session();
    s.discover_foreign(0, DiscoveryMethod::Advertisement).unwrap();
    s.register(params(1)).unwrap();
    s.route(RoutingMethod::Direct, 7).unwrap();

    let err = s.register(params(2)).unwrap_err();
    assert!(err.is_precondition_violation());
    assert_eq!(s.state(), SessionState::HandoffPending { anchor: 0 });
    assert_eq!(s.home_agent().bindings().len(), 1);
}

#[test]
fn test_renewal_keeps_anchor() {
    let mut s = handed_off();
    s.register(params(102)).unwrap();

    assert_eq!(
        s.state(),
        SessionState::ForeignRegistered {
            foreign_agent: 1,
            anchor: Some(0),
        }
    );
    let delivery = s.route(RoutingMethod::Direct, 9).unwrap();
    assert_eq!(delivery.unwraps, 2);
}

#[test]
fn test_indirect_after_handoff_goes_to_new_agent() {
    let mut s = handed_off();

    let delivery = s.route(RoutingMethod::Indirect, 12).unwrap();
    assert_eq!(delivery.hops[1].to, Address::from("20.0.0.2"));
    assert_eq!(delivery.unwraps, 1);
}

#[test]
fn test_second_direct_cycle_anchors_at_current_agent() {
    println!("\n=== Second direct cycle after returning home ===\n");
    let mut s = session();
    s.discover_foreign(0, DiscoveryMethod::Advertisement).unwrap();
    s.register(params(1)).unwrap();
    s.route(RoutingMethod::Direct, 7).unwrap();

    s.discover_home(DiscoveryMethod::Advertisement);
    s.discover_foreign(1, DiscoveryMethod::Advertisement).unwrap();
    s.register(params(2)).unwrap();
    s.route(RoutingMethod::Direct, 8).unwrap();

    assert_eq!(s.state(), SessionState::HandoffPending { anchor: 1 });
    assert_eq!(
        s.correspondent()
            .anchor_for(&Address::from("10.0.0.5"))
            .unwrap(),
        &Address::from("20.0.0.2")
    );
    println!("✓ Correspondent and session agree on anchor 20.0.0.2");

    s.handoff(0, DiscoveryMethod::Advertisement, params(3))
        .unwrap();
    let delivery = s.route(RoutingMethod::Direct, 9).unwrap();

    assert_eq!(delivery.received.sequence_id, 9);
    assert_eq!(delivery.unwraps, 2);
    let route: Vec<(&str, &str)> = delivery
        .hops
        .iter()
        .map(|h| (h.from.as_str(), h.to.as_str()))
        .collect();
    assert_eq!(
        route,
        vec![
            ("30.0.0.9", "20.0.0.2"),
            ("20.0.0.2", "20.0.0.1"),
            ("20.0.0.1", "10.0.0.5"),
        ]
    );
    println!("✓ Datagram #9 relayed by the new anchor");
}

#[test]
fn test_reentering_after_handoff_releases_old_anchor() {
    let mut s = handed_off();
    let home = Address::from("10.0.0.5");
    assert!(s.foreign_agents()[0].forwarding_address(&home).is_some());

    s.discover_home(DiscoveryMethod::Solicitation);
    s.discover_foreign(1, DiscoveryMethod::Solicitation)
        .unwrap();
    s.register(params(102)).unwrap();
    let delivery = s.route(RoutingMethod::Direct, 10).unwrap();

    assert_eq!(delivery.unwraps, 1);
    assert_eq!(delivery.hops[0].to, Address::from("20.0.0.2"));
    assert_eq!(s.state(), SessionState::HandoffPending { anchor: 1 });
    // 20.0.0.1 no longer anchors the node
    assert_eq!(s.foreign_agents()[0].forwarding_address(&home), None);

    s.handoff(0, DiscoveryMethod::Solicitation, params(103))
        .unwrap();
    assert_eq!(
        s.foreign_agents()[1].forwarding_address(&home),
        Some(&Address::from("20.0.0.1"))
    );
    let delivery = s.route(RoutingMethod::Direct, 11).unwrap();
    assert_eq!(delivery.final_hop().unwrap().from, Address::from("20.0.0.1"));
    assert_eq!(delivery.received.sequence_id, 11);
}

#[test]
fn test_rediscovering_anchor_starts_fresh_cycle() {
    let mut s = handed_off();
    let home = Address::from("10.0.0.5");

    s.discover_foreign(0, DiscoveryMethod::Advertisement)
        .unwrap();
    s.register(params(102)).unwrap();
    let delivery = s.route(RoutingMethod::Direct, 10).unwrap();

    // Back at the old anchor, datagrams end there instead of being relayed
    assert_eq!(delivery.unwraps, 1);
    assert_eq!(delivery.final_hop().unwrap().from, Address::from("20.0.0.1"));
    assert_eq!(s.foreign_agents()[0].forwarding_address(&home), None);
    assert_eq!(s.state(), SessionState::HandoffPending { anchor: 0 });
}
