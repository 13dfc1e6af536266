// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Server-side handler registration and dispatch, and the accept/worker
//! thread pool that drives it over TCP.

pub mod dispatcher;
pub mod handler;
pub mod handler_registry;
pub mod server;

pub use handler::{Handler, MethodTable};
pub use handler_registry::{HandlerRegistry, StartupError};
pub use server::{Server, ServerConfig};
