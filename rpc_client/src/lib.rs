// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The client-side proxy: builds a request from a method invocation, resolves
//! an address either statically or through discovery, and awaits one
//! response per call.

pub mod client;

pub use client::{Resolver, RpcClient};
