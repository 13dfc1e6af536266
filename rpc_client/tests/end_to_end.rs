// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! End-to-end scenarios driving the registry, server, and client crates
//! together over real TCP sockets and an in-process coordination service.

use std::collections::HashSet;
use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rpc_client::{Resolver, RpcClient};
use rpc_protocol::error::{RpcError, RpcException};
use rpc_protocol::value::RpcValue;
use rpc_registry::{DiscoveryClient, LocalCoordinationService, RegistryClient};
use rpc_server::handler::{MethodTable, ServiceHandler};
use rpc_server::{HandlerRegistry, Server, ServerConfig};

struct Greeter {
    prefix: &'static str,
}

fn hello(state: &Greeter, _types: &[String], params: &[RpcValue]) -> Result<RpcValue, RpcException> {
    let RpcValue::Str(name) = &params[0] else {
        return Err(RpcException::new("BadArgument", "expected a string"));
    };
    Ok(RpcValue::Str(format!("{}: {name} Hello from HelloServiceImpl1", state.prefix)))
}

fn boom(_state: &Greeter, _types: &[String], _params: &[RpcValue]) -> Result<RpcValue, RpcException> {
    Err(RpcException::new("RuntimeException", "boom"))
}

fn start_hello_server(prefix: &'static str, worker_threads: usize, read_idle: Duration) -> Server {
    let handler = ServiceHandler::new(Greeter { prefix }, MethodTable::new().method("hello", hello).method("boom", boom));
    let registry = Arc::new(
        HandlerRegistry::builder()
            .register("HelloService", "v1.0", handler)
            .unwrap()
            .build(),
    );
    Server::start(
        ServerConfig {
            address: "127.0.0.1:0".to_string(),
            worker_threads,
            read_idle,
        },
        registry,
    )
    .unwrap()
}

fn coordination() -> Arc<LocalCoordinationService> {
    LocalCoordinationService::new(Duration::from_secs(5), Duration::from_secs(1))
}

#[test]
fn s1_single_server_discovered_and_called() {
    let coordination = coordination();
    let registry_client = RegistryClient::new(coordination.clone());
    let discovery = Arc::new(DiscoveryClient::new(coordination));

    let server = start_hello_server("server1", 2, Duration::from_secs(5));
    let registration = registry_client
        .register("HelloService-v1.0", &server.local_addr().to_string())
        .unwrap();

    let client: RpcClient<()> = RpcClient::new("HelloService", "v1.0", Resolver::Discovery(discovery));
    let result = client
        .call("hello", vec!["java.lang.String".to_string()], vec![RpcValue::Str("Jack1".to_string())])
        .unwrap();

    assert_eq!(result, RpcValue::Str("server1: Jack1 Hello from HelloServiceImpl1".to_string()));

    drop(registration);
    server.shutdown();
}

#[test]
fn s2_two_servers_same_key_are_both_eventually_chosen() {
    let coordination = coordination();
    let registry_client = RegistryClient::new(coordination.clone());
    let discovery = Arc::new(DiscoveryClient::new(coordination));

    let server1 = start_hello_server("server1", 2, Duration::from_secs(5));
    let server2 = start_hello_server("server2", 2, Duration::from_secs(5));
    let reg1 = registry_client
        .register("HelloService-v1.0", &server1.local_addr().to_string())
        .unwrap();
    let reg2 = registry_client
        .register("HelloService-v1.0", &server2.local_addr().to_string())
        .unwrap();

    let client: RpcClient<()> = RpcClient::new("HelloService", "v1.0", Resolver::Discovery(discovery));

    let mut prefixes = HashSet::new();
    for _ in 0..100 {
        let result = client
            .call("hello", vec!["java.lang.String".to_string()], vec![RpcValue::Str("Jack1".to_string())])
            .unwrap();
        let RpcValue::Str(text) = result else { panic!("expected a string result") };
        prefixes.insert(text.split(':').next().unwrap().to_string());
    }

    assert_eq!(prefixes, HashSet::from(["server1".to_string(), "server2".to_string()]));

    drop(reg1);
    drop(reg2);
    server1.shutdown();
    server2.shutdown();
}

#[test]
fn s3_missing_version_fails_before_any_connection_is_made() {
    let coordination = coordination();
    let discovery = Arc::new(DiscoveryClient::new(coordination));

    let client: RpcClient<()> = RpcClient::new("HelloService", "v4.0", Resolver::Discovery(discovery));
    let err = client
        .call("hello", vec!["java.lang.String".to_string()], vec![RpcValue::Str("Jack1".to_string())])
        .unwrap_err();

    assert!(matches!(err, RpcError::NoSuchService(_)));
}

#[test]
fn s4_handler_error_is_symmetric_on_the_client() {
    let coordination = coordination();
    let registry_client = RegistryClient::new(coordination.clone());
    let discovery = Arc::new(DiscoveryClient::new(coordination));

    let server = start_hello_server("server1", 2, Duration::from_secs(5));
    let registration = registry_client
        .register("HelloService-v1.0", &server.local_addr().to_string())
        .unwrap();

    let client: RpcClient<()> = RpcClient::new("HelloService", "v1.0", Resolver::Discovery(discovery));
    let err = client.call("boom", vec![], vec![]).unwrap_err();

    match err {
        RpcError::Handler(exc) => assert!(exc.message.contains("boom")),
        other => panic!("expected a handler error, got {other}"),
    }

    drop(registration);
    server.shutdown();
}

#[test]
fn s5_malformed_frame_closes_connection_but_server_stays_up() {
    let server = start_hello_server("server1", 2, Duration::from_secs(5));
    let addr = server.local_addr();

    {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(&(-1i32).to_be_bytes()).unwrap();
    }

    let client: RpcClient<()> = RpcClient::new("HelloService", "v1.0", Resolver::Static(addr.to_string()));
    let result = client
        .call("hello", vec!["java.lang.String".to_string()], vec![RpcValue::Str("Jack1".to_string())])
        .unwrap();
    assert_eq!(result, RpcValue::Str("server1: Jack1 Hello from HelloServiceImpl1".to_string()));

    server.shutdown();
}

#[test]
fn s6_session_loss_removes_one_server_from_discovery() {
    let coordination = coordination();
    let registry_client = RegistryClient::new(coordination.clone());
    let discovery = DiscoveryClient::new(coordination);

    let server1 = start_hello_server("server1", 2, Duration::from_secs(5));
    let server2 = start_hello_server("server2", 2, Duration::from_secs(5));
    let reg1 = registry_client
        .register("HelloService-v1.0", &server1.local_addr().to_string())
        .unwrap();
    let _reg2 = registry_client
        .register("HelloService-v1.0", &server2.local_addr().to_string())
        .unwrap();

    drop(reg1);

    for _ in 0..20 {
        let address = discovery.discover("HelloService-v1.0").unwrap();
        assert_eq!(address, server2.local_addr().to_string());
    }

    server1.shutdown();
    server2.shutdown();
}
