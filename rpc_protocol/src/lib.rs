// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Wire protocol for the RPC framework: the request/response record types, the
//! value representation carried by their fields, the length-prefixed framing
//! codec, and the error taxonomy shared by the client and server crates.

pub mod codec;
pub mod error;
pub mod record;
pub mod value;

pub use error::{ProtocolError, RpcError, RpcException};
pub use record::{RpcRequest, RpcResponse};
pub use value::RpcValue;

/// Derive the lookup token used by both the server's handler map and the
/// registry's path layout from an interface name and a (possibly empty)
/// version label.
///
/// `service_key(I, "") == I`, `service_key(I, " v1 ") == I + "-v1"`: the
/// version is trimmed first, and an empty version after trimming means "no
/// version" rather than contributing a trailing `-`.
pub fn service_key(interface_name: &str, version: &str) -> String {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        interface_name.to_string()
    } else {
        format!("{interface_name}-{trimmed}")
    }
}

/// Generate a fresh, globally-unique request id for one outgoing call.
pub fn fresh_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
