// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Lifetime Policies
//!
//! Decide how long a home agent grants a registration for. The home agent
//! clamps every grant to the requested lifetime, so a policy can only
//! shorten a registration, never extend it.

/// Trait for registration lifetime policies
pub trait LifetimePolicy: Send + Sync + std::fmt::Debug {
    /// Computes the lifetime to grant for a requested lifetime
    fn grant(&self, requested_secs: u32) -> u32;

    /// Returns the policy name
    fn name(&self) -> &str;
}

/// Grants exactly what was requested
#[derive(Debug, Default, Clone, Copy)]
pub struct GrantRequested;

impl LifetimePolicy for GrantRequested {
    fn grant(&self, requested_secs: u32) -> u32 {
        requested_secs
    }

    fn name(&self) -> &str {
        "GrantRequested"
    }
}

/// Caps every grant at a maximum lifetime
#[derive(Debug, Clone, Copy)]
pub struct CapLifetime {
    max_secs: u32,
}

impl CapLifetime {
    pub fn new(max_secs: u32) -> Self {
        Self { max_secs }
    }
}

impl LifetimePolicy for CapLifetime {
    fn grant(&self, requested_secs: u32) -> u32 {
        requested_secs.min(self.max_secs)
    }

    fn name(&self) -> &str {
        "CapLifetime"
    }
}

/// Applies `policy` and clamps the result to `requested_secs`
pub fn granted_lifetime(policy: &dyn LifetimePolicy, requested_secs: u32) -> u32 {
    policy.grant(requested_secs).min(requested_secs)
}
