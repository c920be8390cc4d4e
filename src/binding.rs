// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Mobility binding table (home agent side)

use crate::address::Address;
use crate::store::{EntryStore, StoreEntry};
use serde::{Deserialize, Serialize};

/// Maps a mobile node's home address to its current care-of-address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEntry {
    /// Permanent address of the mobile node
    pub home_address: Address,
    /// Address of the foreign agent currently serving the node
    pub care_of_address: Address,
    /// Granted lifetime in seconds (descriptive, never evicted)
    pub lifetime_secs: u32,
}

impl StoreEntry for BindingEntry {
    const STORE_NAME: &'static str = "mobility binding table";

    fn home_address(&self) -> &Address {
        &self.home_address
    }
}

/// The home agent's mobility binding table
pub type MobilityBindingStore = EntryStore<BindingEntry>;
