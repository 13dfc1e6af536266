// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use log::trace;

use rpc_protocol::codec::{encode_message, MessageDecoder};
use rpc_protocol::error::{ProtocolError, RpcError};
use rpc_protocol::record::{RpcRequest, RpcResponse};
use rpc_protocol::value::RpcValue;
use rpc_protocol::{fresh_request_id, service_key};
use rpc_registry::DiscoveryClient;

/// How a call's target address is obtained.
pub enum Resolver {
    /// Always use this fixed `"host:port"`.
    Static(String),
    /// Resolve `(interface_name, service_version)` through discovery on every
    /// call.
    Discovery(Arc<DiscoveryClient>),
}

/// A proxy for one `(interface, version)` pair. There is no dynamically
/// generated stand-in for an interface trait -- Rust has no runtime proxy
/// facility -- so callers either call `.call(...)` directly, or wrap one of
/// these in a hand-written trait impl for a statically-typed call surface.
pub struct RpcClient<I> {
    interface_name: String,
    service_version: String,
    resolver: Resolver,
    deadline: Option<Duration>,
    _interface: PhantomData<I>,
}

impl<I> RpcClient<I> {
    pub fn new(interface_name: impl Into<String>, service_version: impl Into<String>, resolver: Resolver) -> Self {
        Self {
            interface_name: interface_name.into(),
            service_version: service_version.into(),
            resolver,
            deadline: None,
            _interface: PhantomData,
        }
    }

    /// Bound every call's connection read/write timeouts to `deadline`.
    /// Unset (the default) means a call can block indefinitely on the
    /// network.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Invoke `method_name` with the given declared parameter types and
    /// argument values, and block for the result.
    pub fn call(
        &self,
        method_name: &str,
        parameter_types: Vec<String>,
        parameters: Vec<RpcValue>,
    ) -> Result<RpcValue, RpcError> {
        let address = self.resolve_address()?;

        let request = RpcRequest {
            request_id: fresh_request_id(),
            interface_name: self.interface_name.clone(),
            service_version: self.service_version.clone(),
            method_name: method_name.to_string(),
            parameter_types,
            parameters,
        };

        send_request(&address, &request, self.deadline)
    }

    fn resolve_address(&self) -> Result<String, RpcError> {
        match &self.resolver {
            Resolver::Static(address) => Ok(address.clone()),
            Resolver::Discovery(discovery) => {
                let key = service_key(&self.interface_name, &self.service_version);
                discovery.discover(&key)
            }
        }
    }
}

/// Open a fresh connection, send one request, and await its response. Each
/// call gets its own connection; nothing is pooled or reused.
fn send_request(address: &str, request: &RpcRequest, deadline: Option<Duration>) -> Result<RpcValue, RpcError> {
    trace!("calling {}::{} at {address} (request {})", request.interface_name, request.method_name, request.request_id);

    let stream = TcpStream::connect(address)?;
    stream.set_nodelay(true)?;
    enable_keepalive(&stream)?;

    if let Some(deadline) = deadline {
        stream.set_read_timeout(Some(deadline))?;
        stream.set_write_timeout(Some(deadline))?;
    }

    let mut stream = stream;
    let framed = encode_message(request)?;
    stream.write_all(&framed)?;
    stream.flush()?;

    let mut decoder = MessageDecoder::<RpcResponse>::new();
    let mut buf = [0u8; 4096];
    let response = loop {
        if let Some(response) = decoder.decode_next()? {
            break response;
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(RpcError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before a full response arrived",
            )));
        }
        decoder.feed(&buf[..n]);
    };

    if response.request_id != request.request_id {
        return Err(RpcError::Protocol(ProtocolError::Decode(
            "response request_id did not match the request".to_string(),
        )));
    }

    match response.exception {
        Some(exception) => Err(RpcError::Handler(exception)),
        None => Ok(response.result.unwrap_or(RpcValue::Null)),
    }
}

/// `std` does not expose `SO_KEEPALIVE` on `TcpStream` directly.
fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
    use nix::sys::socket::{setsockopt, sockopt::KeepAlive};
    setsockopt(stream, KeepAlive, &true).map_err(|errno| io::Error::from_raw_os_error(errno as i32))
}
