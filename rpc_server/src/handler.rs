// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Server-side handler surface. A [`Handler`] is the thing a `ServiceKey`
//! resolves to in the [`crate::HandlerRegistry`]; [`MethodTable`] is the
//! "precompute the dispatch once" helper concrete handlers are built from,
//! mirroring the `procedures: Vec<Option<RpcProcedure<T>>>` table a service
//! in this codebase has always built once at construction time, just keyed by
//! method name instead of procedure number.

use std::collections::HashMap;

use rpc_protocol::error::RpcException;
use rpc_protocol::value::RpcValue;

/// An object that can answer calls for one `ServiceKey`. Implementations must
/// be safe to invoke concurrently from any worker thread.
pub trait Handler: Send + Sync {
    fn invoke(
        &self,
        method_name: &str,
        parameter_types: &[String],
        parameters: &[RpcValue],
    ) -> Result<RpcValue, RpcException>;
}

/// A method implementation: takes the handler's own state plus the call's
/// declared parameter types and values, and produces a result or an
/// exception.
pub type Method<S> = fn(&S, &[String], &[RpcValue]) -> Result<RpcValue, RpcException>;

/// A `method_name -> implementation` map, built once per handler and never
/// mutated again -- the "fast dynamic-invocation" table in place of per-call
/// string matching or reflection.
pub struct MethodTable<S> {
    methods: HashMap<&'static str, Method<S>>,
}

impl<S> MethodTable<S> {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    pub fn method(mut self, name: &'static str, implementation: Method<S>) -> Self {
        self.methods.insert(name, implementation);
        self
    }

    fn get(&self, name: &str) -> Option<Method<S>> {
        self.methods.get(name).copied()
    }
}

impl<S> Default for MethodTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Glues a handler's private state to its [`MethodTable`], producing a
/// [`Handler`] ready to hand to [`crate::HandlerRegistry`].
pub struct ServiceHandler<S> {
    state: S,
    methods: MethodTable<S>,
}

impl<S> ServiceHandler<S> {
    pub fn new(state: S, methods: MethodTable<S>) -> Self {
        Self { state, methods }
    }
}

impl<S: Send + Sync> Handler for ServiceHandler<S> {
    fn invoke(
        &self,
        method_name: &str,
        parameter_types: &[String],
        parameters: &[RpcValue],
    ) -> Result<RpcValue, RpcException> {
        match self.methods.get(method_name) {
            Some(implementation) => implementation(&self.state, parameter_types, parameters),
            None => Err(RpcException::new(
                "NoSuchMethod",
                format!("no method named {method_name}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter {
        prefix: String,
    }

    fn hello(state: &Greeter, _types: &[String], params: &[RpcValue]) -> Result<RpcValue, RpcException> {
        let RpcValue::Str(name) = &params[0] else {
            return Err(RpcException::new("BadArgument", "expected a string"));
        };
        Ok(RpcValue::Str(format!("{}{name}", state.prefix)))
    }

    #[test]
    fn dispatches_to_the_registered_method() {
        let handler = ServiceHandler::new(
            Greeter { prefix: "hi ".to_string() },
            MethodTable::new().method("hello", hello),
        );

        let result = handler
            .invoke("hello", &[], &[RpcValue::Str("Jack1".to_string())])
            .unwrap();
        assert_eq!(result, RpcValue::Str("hi Jack1".to_string()));
    }

    #[test]
    fn unknown_method_is_an_exception_not_a_panic() {
        let handler = ServiceHandler::new(Greeter { prefix: "hi ".to_string() }, MethodTable::new());
        let err = handler.invoke("missing", &[], &[]).unwrap_err();
        assert_eq!(err.class_name, "NoSuchMethod");
    }
}
