// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Visitor list (foreign agent side)

use crate::address::{Address, LinkAddress};
use crate::store::{EntryStore, StoreEntry};
use serde::{Deserialize, Serialize};

/// Records a mobile node visiting a foreign network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorEntry {
    /// Permanent address of the visiting mobile node
    pub home_address: Address,
    /// Address of the node's home agent
    pub home_agent_address: Address,
    /// Link-layer address the node is reachable at
    pub link_address: LinkAddress,
    /// Requested lifetime in seconds
    pub lifetime_secs: u32,
}

impl StoreEntry for VisitorEntry {
    const STORE_NAME: &'static str = "visitor list";

    fn home_address(&self) -> &Address {
        &self.home_address
    }
}

/// A foreign agent's visitor list
pub type VisitorListStore = EntryStore<VisitorEntry>;
