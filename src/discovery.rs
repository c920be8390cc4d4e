// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Agent Discovery
//!
//! Lets a mobile node learn whether it is attached to its home network or
//! to a foreign one, and obtain a care-of-address when it is away. The
//! resident agent answers with an advertisement, either unprompted or in
//! response to a solicitation from the node.

use crate::address::Address;
use crate::message::{AgentAdvertisement, AgentSolicitation, DiscoveryMessage};
use crate::node::{ForeignAgent, HomeAgent, MobileNode, NetworkContext};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the node learns about the resident agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMethod {
    /// Wait for the agent's periodic advertisement
    Advertisement,
    /// Solicit an advertisement first
    Solicitation,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMethod::Advertisement => write!(f, "advertisement"),
            DiscoveryMethod::Solicitation => write!(f, "solicitation"),
        }
    }
}

impl std::str::FromStr for DiscoveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "advertisement" => Ok(DiscoveryMethod::Advertisement),
            "solicitation" => Ok(DiscoveryMethod::Solicitation),
            _ => Err(format!(
                "Invalid discovery method: {}. Use 'advertisement' or 'solicitation'",
                s
            )),
        }
    }
}

/// An agent that advertises its presence on a link
pub trait MobilityAgent {
    /// The agent's own address
    fn address(&self) -> &Address;

    /// Builds the advertisement this agent broadcasts
    fn advertise(&self) -> AgentAdvertisement;
}

/// The network the node is attached to, identified by its resident agent
#[derive(Debug, Clone, Copy)]
pub enum Network<'a> {
    Home(&'a HomeAgent),
    Foreign(&'a ForeignAgent),
}

impl Network<'_> {
    pub fn context(&self) -> NetworkContext {
        match self {
            Network::Home(_) => NetworkContext::Home,
            Network::Foreign(_) => NetworkContext::Foreign,
        }
    }

    fn resident_agent(&self) -> &dyn MobilityAgent {
        match *self {
            Network::Home(agent) => agent,
            Network::Foreign(agent) => agent,
        }
    }
}

/// Everything exchanged during one discovery round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    /// Solicitation sent by the node, if it solicited
    pub solicitation: Option<DiscoveryMessage>,
    /// Advertisement sent by the resident agent, as broadcast
    pub advertisement: DiscoveryMessage,
    /// Where the node found itself
    pub context: NetworkContext,
    /// Care-of-address taken from the advertisement (foreign networks only)
    pub care_of_address: Option<Address>,
}

/// Runs agent discovery for `node` on `network`
///
/// On a foreign network the node adopts the advertised care-of-address; at
/// home it drops any care-of-address it had. No agent table is touched.
pub fn discover(
    node: &mut MobileNode,
    network: Network<'_>,
    method: DiscoveryMethod,
) -> DiscoveryOutcome {
    let solicitation = match method {
        DiscoveryMethod::Solicitation => {
            log::info!("Mobile node {}: soliciting agent advertisement", node.address());
            Some(DiscoveryMessage::Solicitation(AgentSolicitation {
                solicitor: node.address().clone(),
            }))
        }
        DiscoveryMethod::Advertisement => {
            log::info!(
                "Mobile node {}: listening for agent advertisement",
                node.address()
            );
            None
        }
    };

    let agent = network.resident_agent();
    let mut advertisement = agent.advertise();
    let broadcast = DiscoveryMessage::Advertisement(advertisement.clone());

    let care_of_address = match network.context() {
        NetworkContext::Foreign => {
            let care_of = advertisement
                .take_care_of_address()
                .unwrap_or_else(|| agent.address().clone());
            log::info!(
                "Mobile node {} is in a foreign network (care-of-address {})",
                node.address(),
                care_of
            );
            node.attach_foreign(care_of.clone());
            Some(care_of)
        }
        NetworkContext::Home => {
            log::info!("Mobile node {} is in its home network", node.address());
            node.return_home();
            None
        }
    };

    DiscoveryOutcome {
        solicitation,
        advertisement: broadcast,
        context: network.context(),
        care_of_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::LinkAddress;

    fn mobile_node() -> MobileNode {
        MobileNode::new(
            Address::from("10.0.0.5"),
            LinkAddress::from("aa:bb:cc:dd:ee:ff"),
            Address::from("10.0.0.1"),
        )
    }

    fn advertisement(outcome: &DiscoveryOutcome) -> &AgentAdvertisement {
        match &outcome.advertisement {
            DiscoveryMessage::Advertisement(adv) => adv,
            other => panic!("expected advertisement, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_discovery_sets_care_of() {
        let mut node = mobile_node();
        let fa = ForeignAgent::new(Address::from("20.0.0.1"));

        let outcome = discover(
            &mut node,
            Network::Foreign(&fa),
            DiscoveryMethod::Advertisement,
        );

        assert_eq!(outcome.context, NetworkContext::Foreign);
        assert!(outcome.solicitation.is_none());
        assert_eq!(node.care_of(), Some(&Address::from("20.0.0.1")));
        assert_eq!(node.location(), NetworkContext::Foreign);

        let adv = advertisement(&outcome);
        assert!(!adv.home_agent);
        assert!(adv.foreign_agent);
        assert!(adv.registration_required);
        assert_eq!(adv.care_of_addresses.len(), 1);
        assert!(fa.visitors().is_empty());
    }

    #[test]
    fn test_home_discovery_with_solicitation() {
        let mut node = mobile_node();
        let ha = HomeAgent::new(Address::from("10.0.0.1"));

        let outcome = discover(&mut node, Network::Home(&ha), DiscoveryMethod::Solicitation);

        assert_eq!(
            outcome.solicitation,
            Some(DiscoveryMessage::Solicitation(AgentSolicitation {
                solicitor: Address::from("10.0.0.5"),
            }))
        );
        assert_eq!(outcome.context, NetworkContext::Home);
        assert_eq!(outcome.care_of_address, None);
        assert_eq!(node.care_of(), None);

        let adv = advertisement(&outcome);
        assert!(adv.home_agent);
        assert!(!adv.foreign_agent);
        assert!(!adv.registration_required);
        assert_eq!(adv.advertiser, Address::from("10.0.0.1"));
        assert!(ha.bindings().is_empty());
    }

    #[test]
    fn test_returning_home_clears_care_of() {
        let mut node = mobile_node();
        let ha = HomeAgent::new(Address::from("10.0.0.1"));
        let fa = ForeignAgent::new(Address::from("20.0.0.1"));

        discover(&mut node, Network::Foreign(&fa), DiscoveryMethod::Advertisement);
        assert!(node.care_of().is_some());

        discover(&mut node, Network::Home(&ha), DiscoveryMethod::Advertisement);
        assert!(node.is_at_home());
        assert_eq!(node.care_of(), None);
    }

    #[test]
    fn test_discovery_method_parsing() {
        assert_eq!(
            "Solicitation".parse::<DiscoveryMethod>().unwrap(),
            DiscoveryMethod::Solicitation
        );
        assert!("broadcast".parse::<DiscoveryMethod>().is_err());
    }
}
