// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;

use log::warn;
use rand::seq::SliceRandom;
use rpc_protocol::RpcError;

use crate::coordination::LocalCoordinationService;
use crate::REGISTRY_ROOT;

/// Resolves a `(interface, version)` service key to one live endpoint,
/// load-balancing across however many servers are currently registered under
/// that key with a uniform random choice.
pub struct DiscoveryClient {
    coordination: Arc<LocalCoordinationService>,
}

impl DiscoveryClient {
    pub fn new(coordination: Arc<LocalCoordinationService>) -> Self {
        Self { coordination }
    }

    /// Resolve `service_key` to one `"host:port"` endpoint.
    ///
    /// Fails with `NoSuchService` if the key was never registered, or
    /// `NoProviders` if it was registered but every server has since left
    /// (ephemeral nodes all expired/dropped).
    pub fn discover(&self, service_key: &str) -> Result<String, RpcError> {
        let session = self.coordination.open_session();

        let service_path = format!("{REGISTRY_ROOT}/{service_key}");
        if !session.exists(&service_path) {
            return Err(RpcError::NoSuchService(service_key.to_string()));
        }

        let children = session.get_children(&service_path).map_err(|e| {
            warn!("failed to list children of {service_path}: {e}");
            RpcError::RegistrySession(e.to_string())
        })?;

        let chosen = match children.as_slice() {
            [] => return Err(RpcError::NoProviders(service_key.to_string())),
            [only] => only,
            many => many.choose(&mut rand::thread_rng()).expect("non-empty slice"),
        };

        let data = session.read_data(&format!("{service_path}/{chosen}")).map_err(|e| {
            warn!("failed to read address node {service_path}/{chosen}: {e}");
            RpcError::RegistrySession(e.to_string())
        })?;

        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
