// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use rpc_protocol::error::RpcException;
use rpc_protocol::record::{RpcRequest, RpcResponse};

use crate::handler_registry::HandlerRegistry;

/// Resolve a decoded request to its handler and produce the response to send
/// back. Never fails: an unresolvable service key or a handler error both
/// become a populated `exception` field rather than a propagated `Err`, since
/// by this point there is always a response record to write to the wire.
pub fn dispatch(registry: &HandlerRegistry, request: RpcRequest) -> RpcResponse {
    let key = request.service_key();

    let Some(handler) = registry.get(&key) else {
        let exception = RpcException::new("NoSuchService", format!("no handler registered for {key}"));
        return RpcResponse::failure(request.request_id, exception);
    };

    match handler.invoke(&request.method_name, &request.parameter_types, &request.parameters) {
        Ok(value) => RpcResponse::success(request.request_id, value),
        Err(exception) => RpcResponse::failure(request.request_id, exception),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, MethodTable, ServiceHandler};
    use crate::handler_registry::HandlerRegistry;
    use rpc_protocol::value::RpcValue;

    struct Greeter;

    fn hello(_s: &Greeter, _t: &[String], params: &[RpcValue]) -> Result<RpcValue, RpcException> {
        let RpcValue::Str(name) = &params[0] else {
            return Err(RpcException::new("BadArgument", "expected a string"));
        };
        Ok(RpcValue::Str(format!("server1: {name} Hello from HelloServiceImpl1")))
    }

    fn boom(_s: &Greeter, _t: &[String], _p: &[RpcValue]) -> Result<RpcValue, RpcException> {
        Err(RpcException::new("RuntimeException", "boom"))
    }

    fn registry() -> HandlerRegistry {
        let handler = ServiceHandler::new(Greeter, MethodTable::new().method("hello", hello).method("boom", boom));
        HandlerRegistry::builder()
            .register("HelloService", "v1.0", handler)
            .unwrap()
            .build()
    }

    fn request(method: &str, args: Vec<RpcValue>) -> RpcRequest {
        RpcRequest {
            request_id: "req-1".to_string(),
            interface_name: "HelloService".to_string(),
            service_version: "v1.0".to_string(),
            method_name: method.to_string(),
            parameter_types: vec!["java.lang.String".to_string(); args.len()],
            parameters: args,
        }
    }

    #[test]
    fn dispatches_to_the_matching_handler() {
        let response = dispatch(&registry(), request("hello", vec![RpcValue::Str("Jack1".to_string())]));
        assert_eq!(response.request_id, "req-1");
        assert_eq!(
            response.result,
            Some(RpcValue::Str("server1: Jack1 Hello from HelloServiceImpl1".to_string()))
        );
        assert!(response.exception.is_none());
    }

    #[test]
    fn unknown_service_key_becomes_an_exception_response() {
        let mut req = request("hello", vec![RpcValue::Str("Jack1".to_string())]);
        req.service_version = "v4.0".to_string();
        let response = dispatch(&registry(), req);

        assert!(response.result.is_none());
        let exc = response.exception.unwrap();
        assert_eq!(exc.class_name, "NoSuchService");
    }

    #[test]
    fn handler_error_is_carried_verbatim_in_the_exception_message() {
        let response = dispatch(&registry(), request("boom", vec![]));
        let exc = response.exception.unwrap();
        assert!(exc.message.contains("boom"));
    }
}
