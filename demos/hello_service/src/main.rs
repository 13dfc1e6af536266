// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! A runnable HelloService exercising the whole framework end to end: wire
//! codec, dispatch, registry, and discovery.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use rpc_client::{Resolver, RpcClient};
use rpc_protocol::error::RpcException;
use rpc_protocol::value::RpcValue;
use rpc_registry::{DiscoveryClient, LocalCoordinationService, RegistryClient};
use rpc_server::handler::{MethodTable, ServiceHandler};
use rpc_server::{HandlerRegistry, Server, ServerConfig};

#[derive(Parser)]
#[command(about = "A minimal HelloService server and client over the RPC framework")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a standalone HelloService server on a fixed address, no registry.
    Serve {
        #[arg(long, default_value = "127.0.0.1:7878")]
        address: String,
        #[arg(long, default_value = "server1")]
        name: String,
    },
    /// Call a standalone HelloService server at a fixed address.
    Call {
        #[arg(long, default_value = "127.0.0.1:7878")]
        address: String,
        #[arg(long, default_value = "Jack1")]
        who: String,
    },
    /// Run two servers under an in-process registry, discover between them,
    /// and call both -- the end-to-end path this crate exists to demonstrate.
    Demo,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { address, name } => serve(address, name),
        Command::Call { address, who } => call_static(address, who),
        Command::Demo => demo(),
    }
}

struct HelloState {
    name: String,
}

fn hello(state: &HelloState, _types: &[String], params: &[RpcValue]) -> Result<RpcValue, RpcException> {
    let Some(RpcValue::Str(who)) = params.first() else {
        return Err(RpcException::new("BadArgument", "hello expects one string argument"));
    };
    Ok(RpcValue::Str(format!("{}: {who} Hello from HelloServiceImpl1", state.name)))
}

fn hello_handler(name: String) -> ServiceHandler<HelloState> {
    ServiceHandler::new(HelloState { name }, MethodTable::new().method("hello", hello))
}

fn start_server(address: &str, name: String, worker_threads: usize) -> Server {
    let registry = Arc::new(
        HandlerRegistry::builder()
            .register("HelloService", "v1.0", hello_handler(name))
            .expect("HelloService is the only registration in this demo")
            .build(),
    );

    Server::start(
        ServerConfig {
            address: address.to_string(),
            worker_threads,
            read_idle: Duration::from_secs(30),
        },
        registry,
    )
    .expect("failed to bind HelloService server")
}

fn serve(address: String, name: String) {
    let server = start_server(&address, name, 4);
    log::info!("HelloService listening on {}", server.local_addr());
    loop {
        std::thread::park();
    }
}

fn call_static(address: String, who: String) {
    let client: RpcClient<()> = RpcClient::new("HelloService", "v1.0", Resolver::Static(address));
    print_call_result(client.call("hello", vec!["java.lang.String".to_string()], vec![RpcValue::Str(who)]));
}

fn demo() {
    let coordination = LocalCoordinationService::new(Duration::from_secs(5), Duration::from_secs(1));
    let registry_client = RegistryClient::new(coordination.clone());
    let discovery_client = Arc::new(DiscoveryClient::new(coordination));

    let server1 = start_server("127.0.0.1:0", "server1".to_string(), 2);
    let server2 = start_server("127.0.0.1:0", "server2".to_string(), 2);

    let registration1 = registry_client
        .register("HelloService-v1.0", &server1.local_addr().to_string())
        .expect("server1 registers under HelloService-v1.0");
    let registration2 = registry_client
        .register("HelloService-v1.0", &server2.local_addr().to_string())
        .expect("server2 registers under HelloService-v1.0");

    let client: RpcClient<()> = RpcClient::new("HelloService", "v1.0", Resolver::Discovery(discovery_client));

    for who in ["Jack1", "Jack2", "Jack3", "Jack4"] {
        print_call_result(client.call(
            "hello",
            vec!["java.lang.String".to_string()],
            vec![RpcValue::Str(who.to_string())],
        ));
    }

    drop(registration1);
    drop(registration2);
    server1.shutdown();
    server2.shutdown();
}

fn print_call_result(result: Result<RpcValue, rpc_protocol::error::RpcError>) {
    match result {
        Ok(RpcValue::Str(text)) => println!("{text}"),
        Ok(other) => println!("{other:?}"),
        Err(e) => eprintln!("call failed: {e}"),
    }
}
