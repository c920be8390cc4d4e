// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Human-readable tables
//!
//! Renders snapshots of the agents' tables and the mobile node for the
//! terminal. Rows follow store order, newest first.

use crate::binding::BindingEntry;
use crate::node::MobileNode;
use crate::visitor::VisitorEntry;
use std::fmt;

const BINDING_RULE: &str = "---------------------------------------------------------";
const VISITOR_RULE: &str =
    "---------------------------------------------------------------------------";

/// Mobility binding table of a home agent
pub struct BindingTable<'a>(pub &'a [BindingEntry]);

impl fmt::Display for BindingTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", BINDING_RULE)?;
        writeln!(f, "{:^57}", "Mobility Binding Table")?;
        writeln!(f, "{}", BINDING_RULE)?;
        writeln!(
            f,
            "| {:<15} | {:<15} | {:>15} |",
            "Home Address", "Care-of-Address", "Lifetime(sec)"
        )?;
        writeln!(f, "{}", BINDING_RULE)?;
        if self.0.is_empty() {
            writeln!(f, "| {:<53} |", "(empty)")?;
        }
        for entry in self.0 {
            writeln!(
                f,
                "| {:<15} | {:<15} | {:>15} |",
                entry.home_address.as_str(),
                entry.care_of_address.as_str(),
                entry.lifetime_secs
            )?;
        }
        writeln!(f, "{}", BINDING_RULE)
    }
}

/// Visitor list of a foreign agent
pub struct VisitorTable<'a>(pub &'a [VisitorEntry]);

impl fmt::Display for VisitorTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", VISITOR_RULE)?;
        writeln!(f, "{:^75}", "Visitor List")?;
        writeln!(f, "{}", VISITOR_RULE)?;
        writeln!(
            f,
            "| {:<15} | {:<15} | {:<17} | {:>15} |",
            "Home Address", "Home Agent", "Media Address", "Lifetime(sec)"
        )?;
        writeln!(f, "{}", VISITOR_RULE)?;
        if self.0.is_empty() {
            writeln!(f, "| {:<71} |", "(empty)")?;
        }
        for entry in self.0 {
            writeln!(
                f,
                "| {:<15} | {:<15} | {:<17} | {:>15} |",
                entry.home_address.as_str(),
                entry.home_agent_address.as_str(),
                entry.link_address.as_str(),
                entry.lifetime_secs
            )?;
        }
        writeln!(f, "{}", VISITOR_RULE)
    }
}

/// Addresses of the mobile node
pub struct NodeSummary<'a>(pub &'a MobileNode);

impl fmt::Display for NodeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0;
        writeln!(f, "Mobile Node")?;
        writeln!(f, "  Home Address:    {}", node.address())?;
        writeln!(f, "  Media Address:   {}", node.link_address())?;
        writeln!(f, "  Home Agent:      {}", node.home_agent())?;
        writeln!(
            f,
            "  Care-of-Address: {}",
            node.care_of().map_or("N/A", |coa| coa.as_str())
        )?;
        writeln!(f, "  Network:         {}", node.location())
    }
}
