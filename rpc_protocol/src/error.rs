// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

/// Errors that are fatal to a connection: a frame could not be parsed at all,
/// so there is no reply to send back, only a socket to close.
#[derive(Debug)]
pub enum ProtocolError {
    /// The 4-byte length prefix was negative, or larger than `MAX_FRAME`.
    InvalidLength(i64),

    /// A frame was read successfully but its payload did not decode into the
    /// expected record type.
    Decode(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => write!(f, "invalid frame length {len}"),
            Self::Decode(reason) => write!(f, "error decoding frame: {reason}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// A structured error value carried in [`crate::RpcResponse::exception`][resp] and
/// re-raised at the proxy.
///
/// [resp]: crate::RpcResponse::exception
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcException {
    /// A stable tag for the kind of error (e.g. `"NoSuchService"`, or the
    /// handler's own error type name).
    pub class_name: String,
    /// Human-readable text. Must contain the original error's message
    /// verbatim so callers can recognize it (exception symmetry).
    pub message: String,
}

impl RpcException {
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn no_such_service(key: &str) -> Self {
        Self::new("NoSuchService", format!("no handler registered for {key}"))
    }
}

impl fmt::Display for RpcException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class_name, self.message)
    }
}

impl std::error::Error for RpcException {}

/// The error taxonomy shared across the registry, server, and client crates.
#[derive(Debug)]
pub enum RpcError {
    /// Malformed frame or record; the connection that produced it is closed.
    Protocol(ProtocolError),

    /// Registry lookup found no service node, or the server has no handler
    /// for the requested key.
    NoSuchService(String),

    /// The service node exists but currently has no live endpoint children.
    NoProviders(String),

    /// The remote handler raised an error while processing the call.
    Handler(RpcException),

    /// Connect, read, or write failure, including an idle-timeout close.
    Transport(std::io::Error),

    /// The coordination client could not complete the requested operation.
    RegistrySession(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::NoSuchService(key) => write!(f, "no such service: {key}"),
            Self::NoProviders(key) => write!(f, "no providers registered for: {key}"),
            Self::Handler(exc) => write!(f, "remote exception: {exc}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::RegistrySession(reason) => write!(f, "registry session error: {reason}"),
        }
    }
}

impl std::error::Error for RpcError {}

impl From<std::io::Error> for RpcError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<ProtocolError> for RpcError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}
