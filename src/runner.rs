// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Scenario runner
//!
//! Builds a topology from a [`SimulationConfig`] and walks one mobility
//! session through the configured path. The optional step delay only
//! paces the run for a human watching the log.

use crate::address::{Address, AddressAllocator, LinkAddress};
use crate::binding::BindingEntry;
use crate::config::SimulationConfig;
use crate::error::{AddressError, MipError};
use crate::node::{CorrespondentNode, ForeignAgent, HomeAgent, MobileNode, NetworkContext};
use crate::policies::CapLifetime;
use crate::registration::RegistrationParams;
use crate::routing::{Delivery, RoutingMethod};
use crate::session::{Session, SessionState};
use crate::trace::Trace;
use crate::visitor::VisitorEntry;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::Duration;

/// Visitor list snapshot of one foreign agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentVisitors {
    pub foreign_agent: Address,
    pub entries: Vec<VisitorEntry>,
}

/// Everything a finished run leaves behind
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub final_state: SessionState,
    pub node: MobileNode,
    pub home_agent: Address,
    pub bindings: Vec<BindingEntry>,
    pub visitors: Vec<AgentVisitors>,
    pub deliveries: Vec<Delivery>,
    pub trace: Trace,
}

impl ScenarioReport {
    fn from_session(session: Session, deliveries: Vec<Delivery>) -> Self {
        let visitors = session
            .foreign_agents()
            .iter()
            .map(|fa| AgentVisitors {
                foreign_agent: fa.address().clone(),
                entries: fa.visitors().entries().to_vec(),
            })
            .collect();

        Self {
            final_state: session.state(),
            node: session.node().clone(),
            home_agent: session.home_agent().address().clone(),
            bindings: session.home_agent().bindings().entries().to_vec(),
            visitors,
            deliveries,
            trace: session.into_trace(),
        }
    }
}

struct Pacer {
    delay: Duration,
}

impl Pacer {
    fn new(step_delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(step_delay_ms),
        }
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn next_id(id: u64, kind: &str) -> Result<u64, MipError> {
    id.checked_add(1)
        .ok_or_else(|| MipError::Config(format!("{} id {} has no successor", kind, id)))
}

fn reserve_fixed(
    allocator: &mut AddressAllocator,
    fixed: Option<&String>,
) -> Result<Option<Address>, AddressError> {
    fixed.map(|addr| allocator.reserve(addr)).transpose()
}

/// Builds the session topology
///
/// Fixed addresses are reserved before any are generated, so a generated
/// address never collides with one named in the scenario.
pub fn build_session(config: &SimulationConfig, rng: &mut StdRng) -> Result<Session, MipError> {
    let plan = &config.addresses;
    let mut allocator = AddressAllocator::with_seed(rng.next_u64());

    let node_addr = reserve_fixed(&mut allocator, plan.mobile_node.as_ref())?;
    let ha_addr = reserve_fixed(&mut allocator, plan.home_agent.as_ref())?;
    let cn_addr = reserve_fixed(&mut allocator, plan.correspondent.as_ref())?;
    let mut fa_addrs = plan
        .foreign_agents
        .iter()
        .map(|addr| allocator.reserve(addr))
        .collect::<Result<Vec<_>, _>>()?;

    let node_addr = node_addr.map_or_else(|| allocator.allocate(), Ok)?;
    let ha_addr = ha_addr.map_or_else(|| allocator.allocate(), Ok)?;
    let cn_addr = cn_addr.map_or_else(|| allocator.allocate(), Ok)?;
    while fa_addrs.len() < config.foreign_agents {
        fa_addrs.push(allocator.allocate()?);
    }
    let link = match &plan.link_address {
        Some(link) => LinkAddress::new(link.clone()),
        None => allocator.allocate_link()?,
    };

    let home_agent = match config.max_lifetime_secs {
        Some(max) => HomeAgent::with_policy(ha_addr.clone(), Box::new(CapLifetime::new(max))),
        None => HomeAgent::new(ha_addr.clone()),
    };
    log::info!(
        "Topology: mobile node {} (link {}), home agent {} [{}], correspondent {}, foreign agents {:?}",
        node_addr,
        link,
        ha_addr,
        home_agent.lifetime_policy().name(),
        cn_addr,
        fa_addrs.iter().map(Address::as_str).collect::<Vec<_>>()
    );

    Ok(Session::new(
        MobileNode::new(node_addr, link, ha_addr),
        home_agent,
        fa_addrs.into_iter().map(ForeignAgent::new).collect(),
        CorrespondentNode::new(cn_addr),
    ))
}

/// Runs the configured scenario to completion
pub async fn run_scenario(config: &SimulationConfig) -> Result<ScenarioReport, MipError> {
    config.validate()?;

    let mut rng = seeded_rng(config.seed);
    let mut session = build_session(config, &mut rng)?;
    let pacer = Pacer::new(config.step_delay_ms);
    let mut deliveries = Vec::new();

    match config.network {
        NetworkContext::Home => {
            log::info!("=== Agent discovery (home network) ===");
            session.discover_home(config.discovery);
        }
        NetworkContext::Foreign => {
            let params = RegistrationParams {
                requested_lifetime_secs: config.lifetime_secs,
                correlation_id: config
                    .correlation_id
                    .unwrap_or_else(|| rng.gen_range(1..=u64::from(u32::MAX))),
            };
            let sequence_id = config
                .sequence_id
                .unwrap_or_else(|| rng.gen_range(1..=u64::from(u32::MAX)));

            log::info!("=== Agent discovery (foreign network) ===");
            session.discover_foreign(0, config.discovery)?;
            pacer.pause().await;

            log::info!("=== Registration ===");
            session.register(params)?;
            pacer.pause().await;

            log::info!("=== {} routing ===", config.routing);
            deliveries.push(session.route(config.routing, sequence_id)?);

            if config.routing == RoutingMethod::Direct {
                pacer.pause().await;
                log::info!("=== Handoff ===");
                let renewal = RegistrationParams {
                    correlation_id: next_id(params.correlation_id, "correlation")?,
                    ..params
                };
                session.handoff(1, config.discovery, renewal)?;
                pacer.pause().await;

                log::info!("=== Delivery through anchor ===");
                let next_sequence = next_id(sequence_id, "sequence")?;
                deliveries.push(session.route(RoutingMethod::Direct, next_sequence)?);
            }
        }
    }

    Ok(ScenarioReport::from_session(session, deliveries))
}
