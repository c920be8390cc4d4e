// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Pluggable Policies
//!
//! This module provides pluggable policy interfaces for:
//! - Registration lifetime grants

pub mod lifetime;

pub use lifetime::{CapLifetime, GrantRequested, LifetimePolicy, granted_lifetime};
