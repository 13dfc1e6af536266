// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::sync::Arc;

use log::warn;
use rpc_protocol::RpcError;

use crate::coordination::{CoordinationSession, LocalCoordinationService};
use crate::REGISTRY_ROOT;

/// Publishes service endpoints under the coordination client's registry
/// tree. One `RegistryClient` is typically shared by a server process to
/// register every `(interface, version)` key it serves.
pub struct RegistryClient {
    coordination: Arc<LocalCoordinationService>,
}

/// A live registration: while this value is alive, the server's endpoint is
/// discoverable. Dropping it (or calling `.close()`) ends the underlying
/// session, which removes the ephemeral address node -- the persistent
/// service node itself is left behind for other servers under the same key.
pub struct Registration {
    session: CoordinationSession,
    path: String,
}

impl Registration {
    /// The full path of this registration's ephemeral address node.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// End this registration's session, removing its ephemeral address node.
    pub fn close(self) {
        self.session.close();
    }
}

impl RegistryClient {
    pub fn new(coordination: Arc<LocalCoordinationService>) -> Self {
        Self { coordination }
    }

    /// Register `service_address` ("host:port") under `service_key`.
    ///
    /// Ensures the registry root and the service's persistent node exist,
    /// then creates an ephemeral-sequential child carrying the address.
    pub fn register(&self, service_key: &str, service_address: &str) -> Result<Registration, RpcError> {
        let session = self.coordination.open_session();

        if !session.exists(REGISTRY_ROOT) {
            session.create_persistent(REGISTRY_ROOT).map_err(|e| {
                warn!("failed to create registry root {REGISTRY_ROOT}: {e}");
                RpcError::RegistrySession(e.to_string())
            })?;
        }

        let service_path = format!("{REGISTRY_ROOT}/{service_key}");
        if !session.exists(&service_path) {
            session.create_persistent(&service_path).map_err(|e| {
                warn!("failed to create service node {service_path}: {e}");
                RpcError::RegistrySession(e.to_string())
            })?;
        }

        let path = session
            .create_ephemeral_sequential(&service_path, service_address.as_bytes())
            .map_err(|e| {
                warn!("failed to register {service_address} under {service_path}: {e}");
                RpcError::RegistrySession(e.to_string())
            })?;

        Ok(Registration { session, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service() -> Arc<LocalCoordinationService> {
        LocalCoordinationService::new(Duration::from_secs(5), Duration::from_secs(1))
    }

    #[test]
    fn register_creates_persistent_and_ephemeral_nodes() {
        let coordination = service();
        let client = RegistryClient::new(coordination.clone());

        let registration = client.register("HelloService-v1.0", "127.0.0.1:18001").unwrap();

        assert!(coordination.exists("/registry"));
        assert!(coordination.exists("/registry/HelloService-v1.0"));
        assert!(coordination.exists(registration.path()));
    }

    #[test]
    fn two_servers_can_register_under_the_same_key() {
        let coordination = service();
        let client = RegistryClient::new(coordination.clone());

        let r1 = client.register("HelloService-v1.0", "127.0.0.1:18001").unwrap();
        let r2 = client.register("HelloService-v1.0", "127.0.0.1:18002").unwrap();

        assert_ne!(r1.path(), r2.path());
    }

    #[test]
    fn dropping_registration_removes_only_its_ephemeral_node() {
        let coordination = service();
        let client = RegistryClient::new(coordination.clone());

        let r1 = client.register("HelloService-v1.0", "127.0.0.1:18001").unwrap();
        let r2 = client.register("HelloService-v1.0", "127.0.0.1:18002").unwrap();
        let r1_path = r1.path().to_string();
        let r2_path = r2.path().to_string();

        drop(r1);

        assert!(!coordination.exists(&r1_path));
        assert!(coordination.exists(&r2_path));
        assert!(coordination.exists("/registry/HelloService-v1.0"));
    }
}
