// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Addresses and address allocation
//!
//! Protocol code treats [`Address`] and [`LinkAddress`] as opaque
//! identifiers: equality is the only operation lookups rely on. Only the
//! [`AddressAllocator`] looks inside them, to generate fresh values and to
//! validate addresses supplied by a scenario file.

use crate::error::AddressError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Attempts made to find an unused address before giving up
const MAX_ATTEMPTS: u32 = 1024;

/// A permanent or care-of network address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A link-layer (media) address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkAddress(String);

impl LinkAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LinkAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generates unique network and link-layer addresses
///
/// Network addresses are dotted quads with the first octet in 192..=222
/// and the rest in 1..=254. Every address handed out or reserved is
/// remembered, so the allocator never issues the same value twice.
#[derive(Debug)]
pub struct AddressAllocator {
    rng: StdRng,
    issued: HashSet<String>,
}

impl AddressAllocator {
    /// Creates an allocator with a fixed seed, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    /// Allocates a fresh network address
    pub fn allocate(&mut self) -> Result<Address, AddressError> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = format!(
                "{}.{}.{}.{}",
                self.rng.gen_range(192..=222u8),
                self.rng.gen_range(1..=254u8),
                self.rng.gen_range(1..=254u8),
                self.rng.gen_range(1..=254u8)
            );
            if self.issued.insert(candidate.clone()) {
                log::debug!("Allocated network address {}", candidate);
                return Ok(Address(candidate));
            }
        }
        Err(AddressError::Exhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Allocates a fresh link-layer address
    pub fn allocate_link(&mut self) -> Result<LinkAddress, AddressError> {
        for _ in 0..MAX_ATTEMPTS {
            let octets: Vec<String> = (0..6)
                .map(|_| format!("{:02x}", self.rng.gen_range(0..=255u8)))
                .collect();
            let candidate = octets.join(":");
            if self.issued.insert(candidate.clone()) {
                log::debug!("Allocated link address {}", candidate);
                return Ok(LinkAddress(candidate));
            }
        }
        Err(AddressError::Exhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Claims an externally chosen network address
    pub fn reserve(&mut self, addr: &str) -> Result<Address, AddressError> {
        validate_ipv4(addr)?;
        if !self.issued.insert(addr.to_string()) {
            return Err(AddressError::Duplicate(addr.to_string()));
        }
        Ok(Address(addr.to_string()))
    }

    /// Returns whether the address has been issued or reserved
    pub fn is_taken(&self, addr: &str) -> bool {
        self.issued.contains(addr)
    }

    /// Returns the number of addresses handed out so far
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

/// Checks that `addr` is a dotted-quad IPv4 address
pub fn validate_ipv4(addr: &str) -> Result<(), AddressError> {
    let octets: Vec<&str> = addr.split('.').collect();
    let valid = octets.len() == 4
        && octets
            .iter()
            .all(|o| o.bytes().all(|b| b.is_ascii_digit()) && o.parse::<u8>().is_ok());
    if valid {
        Ok(())
    } else {
        Err(AddressError::Invalid(addr.to_string()))
    }
}
