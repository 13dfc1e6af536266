// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rpc_protocol::service_key;

use crate::handler::Handler;

/// Raised by [`HandlerRegistryBuilder::register`] when two registrations
/// resolve to the same `ServiceKey`.
#[derive(Debug)]
pub enum StartupError {
    DuplicateService(String),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateService(key) => write!(f, "duplicate service registration: {key}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// An immutable `ServiceKey -> Handler` map, built once at server startup and
/// shared read-only across every worker thread. There is no method to mutate
/// it after [`HandlerRegistryBuilder::build`] -- concurrent reads need no
/// locking because the type gives them nowhere to write.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(key)
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        interface_name: &str,
        version: &str,
        handler: impl Handler + 'static,
    ) -> Result<Self, StartupError> {
        let key = service_key(interface_name, version);
        if self.handlers.contains_key(&key) {
            return Err(StartupError::DuplicateService(key));
        }
        self.handlers.insert(key, Arc::new(handler));
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_protocol::error::RpcException;
    use rpc_protocol::value::RpcValue;

    struct Noop;

    impl Handler for Noop {
        fn invoke(&self, _m: &str, _t: &[String], _p: &[RpcValue]) -> Result<RpcValue, RpcException> {
            Ok(RpcValue::Null)
        }
    }

    #[test]
    fn registers_and_looks_up_by_service_key() {
        let registry = HandlerRegistry::builder()
            .register("HelloService", "v1.0", Noop)
            .unwrap()
            .build();

        assert!(registry.get("HelloService-v1.0").is_some());
        assert!(registry.get("HelloService-v2.0").is_none());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let err = HandlerRegistry::builder()
            .register("HelloService", "v1.0", Noop)
            .unwrap()
            .register("HelloService", " v1.0 ", Noop)
            .unwrap_err();

        assert!(matches!(err, StartupError::DuplicateService(key) if key == "HelloService-v1.0"));
    }
}
