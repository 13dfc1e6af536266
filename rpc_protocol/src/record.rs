// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use crate::error::{ProtocolError, RpcException};
use crate::value::{
    decode_optional_value, decode_string, decode_string_list, decode_value_list,
    encode_optional_value, encode_string, encode_string_list, encode_value_list,
};
use crate::RpcValue;

/// A record that can be placed on the wire inside a length-prefixed frame.
///
/// `field_names` exposes the record's schema (field names in declaration
/// order) so the codec's schema cache (see [`crate::codec`]) has something to
/// cache per type. Encoding/decoding of the fields themselves is implemented
/// directly by each record rather than derived through runtime reflection:
/// Rust's static dispatch already gives us the "resolve once, not per call"
/// property the schema cache exists for, without needing to walk fields by
/// name at runtime.
pub trait WireRecord: Sized {
    /// A stable tag identifying this record type, used as the schema cache key.
    fn type_tag() -> &'static str;

    /// The record's field names, in declaration order.
    fn field_names() -> &'static [&'static str];

    fn encode_fields(&self, buf: &mut Vec<u8>);

    fn decode_fields(buf: &mut &[u8]) -> Result<Self, ProtocolError>;
}

/// A value record exchanged client -> server.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Opaque unique string (globally unique per call).
    pub request_id: String,
    /// Fully qualified service interface identifier.
    pub interface_name: String,
    /// Version label, possibly empty.
    pub service_version: String,
    /// Operation name on the interface.
    pub method_name: String,
    /// Ordered list of type identifiers describing each argument's declared type.
    pub parameter_types: Vec<String>,
    /// Ordered list of argument values.
    pub parameters: Vec<RpcValue>,
}

impl RpcRequest {
    /// The `ServiceKey` this request should be dispatched under.
    pub fn service_key(&self) -> String {
        crate::service_key(&self.interface_name, &self.service_version)
    }
}

impl WireRecord for RpcRequest {
    fn type_tag() -> &'static str {
        "RpcRequest"
    }

    fn field_names() -> &'static [&'static str] {
        &[
            "request_id",
            "interface_name",
            "service_version",
            "method_name",
            "parameter_types",
            "parameters",
        ]
    }

    fn encode_fields(&self, buf: &mut Vec<u8>) {
        encode_string(&self.request_id, buf);
        encode_string(&self.interface_name, buf);
        encode_string(&self.service_version, buf);
        encode_string(&self.method_name, buf);
        encode_string_list(&self.parameter_types, buf);
        encode_value_list(&self.parameters, buf);
    }

    fn decode_fields(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        Ok(RpcRequest {
            request_id: decode_string(buf)?,
            interface_name: decode_string(buf)?,
            service_version: decode_string(buf)?,
            method_name: decode_string(buf)?,
            parameter_types: decode_string_list(buf)?,
            parameters: decode_value_list(buf)?,
        })
    }
}

/// A value record exchanged server -> client.
///
/// Exactly one of `result` / `exception` is populated: when a call succeeds
/// with no meaningful return value, `result` is `Some(RpcValue::Null)`, never
/// `None` with `exception` also `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    /// Echoes the originating request's id.
    pub request_id: String,
    pub result: Option<RpcValue>,
    pub exception: Option<RpcException>,
}

impl RpcResponse {
    pub fn success(request_id: impl Into<String>, value: RpcValue) -> Self {
        Self {
            request_id: request_id.into(),
            result: Some(value),
            exception: None,
        }
    }

    pub fn failure(request_id: impl Into<String>, exception: RpcException) -> Self {
        Self {
            request_id: request_id.into(),
            result: None,
            exception: Some(exception),
        }
    }
}

impl WireRecord for RpcResponse {
    fn type_tag() -> &'static str {
        "RpcResponse"
    }

    fn field_names() -> &'static [&'static str] {
        &["request_id", "result", "exception"]
    }

    fn encode_fields(&self, buf: &mut Vec<u8>) {
        encode_string(&self.request_id, buf);
        encode_optional_value(&self.result, buf);
        match &self.exception {
            Some(exc) => {
                buf.push(1);
                encode_string(&exc.class_name, buf);
                encode_string(&exc.message, buf);
            }
            None => buf.push(0),
        }
    }

    fn decode_fields(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let request_id = decode_string(buf)?;
        let result = decode_optional_value(buf)?;
        let has_exception = {
            if buf.is_empty() {
                return Err(ProtocolError::Decode(
                    "payload ended before exception marker".to_string(),
                ));
            }
            let (head, rest) = buf.split_at(1);
            *buf = rest;
            head[0] != 0
        };
        let exception = if has_exception {
            let class_name = decode_string(buf)?;
            let message = decode_string(buf)?;
            Some(RpcException::new(class_name, message))
        } else {
            None
        };

        Ok(RpcResponse {
            request_id,
            result,
            exception,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let req = RpcRequest {
            request_id: "abc".to_string(),
            interface_name: "HelloService".to_string(),
            service_version: "v1.0".to_string(),
            method_name: "hello".to_string(),
            parameter_types: vec!["java.lang.String".to_string()],
            parameters: vec![RpcValue::Str("Jack1".to_string())],
        };

        let mut buf = Vec::new();
        req.encode_fields(&mut buf);
        let decoded = RpcRequest::decode_fields(&mut buf.as_slice()).unwrap();
        assert_eq!(req, decoded);
    }

    #[test]
    fn response_round_trips_success() {
        let resp = RpcResponse::success("abc", RpcValue::Str("hi".to_string()));
        let mut buf = Vec::new();
        resp.encode_fields(&mut buf);
        let decoded = RpcResponse::decode_fields(&mut buf.as_slice()).unwrap();
        assert_eq!(resp, decoded);
    }

    #[test]
    fn response_round_trips_exception() {
        let resp = RpcResponse::failure("abc", RpcException::new("RuntimeException", "boom"));
        let mut buf = Vec::new();
        resp.encode_fields(&mut buf);
        let decoded = RpcResponse::decode_fields(&mut buf.as_slice()).unwrap();
        assert_eq!(resp, decoded);
    }
}
