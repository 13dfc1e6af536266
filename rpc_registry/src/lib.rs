// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Service registration and discovery, built against a small coordination
//! client trait (`coordination`) rather than any particular distributed
//! backend.
//!
//! The root under which every service key lives:
//! ```text
//! /registry/
//!     <service_key>/              (persistent)
//!         address-0000000001     (ephemeral, payload = "host:port")
//!         address-0000000002
//! ```

pub mod coordination;
pub mod discovery;
pub mod registry;

pub use coordination::{CoordinationError, CoordinationSession, LocalCoordinationService};
pub use discovery::DiscoveryClient;
pub use registry::{Registration, RegistryClient};

/// Fixed root path under which every service key's node lives.
pub const REGISTRY_ROOT: &str = "/registry";
