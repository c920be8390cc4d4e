// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Keyed entry store
//!
//! Shared storage behind the mobility binding table and the visitor list.
//! Entries are keyed by the mobile node's home address. A newer entry for
//! the same key supersedes the old one and moves to the front, so the
//! store always reads most-recent-first.

use crate::address::Address;
use crate::error::StoreError;

/// An entry that can live in an [`EntryStore`]
pub trait StoreEntry: Clone {
    /// Human-readable store name used in errors and logs
    const STORE_NAME: &'static str;

    /// The home address this entry is keyed by
    fn home_address(&self) -> &Address;
}

/// Most-recent-first store with supersede-by-key semantics
#[derive(Debug, Clone)]
pub struct EntryStore<E> {
    entries: Vec<E>,
}

impl<E: StoreEntry> EntryStore<E> {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts an entry, replacing any existing entry for the same home address
    ///
    /// Returns the superseded entry, if there was one.
    pub fn upsert(&mut self, entry: E) -> Option<E> {
        let previous = self
            .entries
            .iter()
            .position(|e| e.home_address() == entry.home_address())
            .map(|idx| self.entries.remove(idx));

        log::debug!(
            "{}: {} entry for {}",
            E::STORE_NAME,
            if previous.is_some() { "superseded" } else { "added" },
            entry.home_address()
        );

        self.entries.insert(0, entry);
        previous
    }

    /// Looks up the current entry for a home address
    pub fn lookup(&self, home_address: &Address) -> Result<&E, StoreError> {
        self.entries
            .iter()
            .find(|e| e.home_address() == home_address)
            .ok_or_else(|| StoreError::NotFound {
                store: E::STORE_NAME,
                key: home_address.clone(),
            })
    }

    /// Returns whether an entry exists for the home address
    pub fn contains(&self, home_address: &Address) -> bool {
        self.entries.iter().any(|e| e.home_address() == home_address)
    }

    /// Read-only snapshot of all entries, most recent first
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: StoreEntry> Default for EntryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        home: Address,
        tag: u32,
    }

    impl StoreEntry for Sample {
        const STORE_NAME: &'static str = "sample store";

        fn home_address(&self) -> &Address {
            &self.home
        }
    }

    fn sample(home: &str, tag: u32) -> Sample {
        Sample {
            home: Address::from(home),
            tag,
        }
    }

    #[test]
    fn test_store_upsert_and_lookup() {
        let mut store = EntryStore::new();
        assert!(store.is_empty());

        assert!(store.upsert(sample("10.0.0.5", 1)).is_none());

        let entry = store.lookup(&Address::from("10.0.0.5")).unwrap();
        assert_eq!(entry.tag, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_supersede_keeps_one_entry() {
        let mut store = EntryStore::new();
        store.upsert(sample("10.0.0.5", 1));
        store.upsert(sample("10.0.0.6", 2));

        let old = store.upsert(sample("10.0.0.5", 3)).unwrap();
        assert_eq!(old.tag, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(&Address::from("10.0.0.5")).unwrap().tag, 3);
    }

    #[test]
    fn test_store_most_recent_first() {
        let mut store = EntryStore::new();
        store.upsert(sample("a", 1));
        store.upsert(sample("b", 2));
        store.upsert(sample("a", 3));

        let tags: Vec<u32> = store.entries().iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![3, 2]);
    }

    #[test]
    fn test_store_lookup_miss() {
        let store: EntryStore<Sample> = EntryStore::new();
        let err = store.lookup(&Address::from("10.0.0.9")).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                store: "sample store",
                key: Address::from("10.0.0.9"),
            }
        );
        assert!(!store.contains(&Address::from("10.0.0.9")));
    }
}
