// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The accept/worker thread pool. An acceptor thread polls a non-blocking
//! listener and hands accepted connections to a bounded pool of worker
//! threads over a `sync_channel`; each worker runs one connection's whole
//! receive/dispatch/send pipeline before going back for the next one.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, warn};

use rpc_protocol::codec::{encode_message, MessageDecoder};
use rpc_protocol::error::RpcError;
use rpc_protocol::record::RpcRequest;

use crate::dispatcher;
use crate::handler_registry::HandlerRegistry;

/// How long the acceptor sleeps between non-blocking `accept()` polls when
/// nothing is ready.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct ServerConfig {
    /// Address to bind, e.g. `"127.0.0.1:0"` for an ephemeral test port.
    pub address: String,
    /// Number of worker threads draining accepted connections.
    pub worker_threads: usize,
    /// How long a connection may sit with no inbound bytes before it is
    /// closed by the server.
    pub read_idle: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:0".to_string(),
            worker_threads: 4,
            read_idle: Duration::from_secs(30),
        }
    }
}

/// A running server. Dropping this without calling [`Server::shutdown`] does
/// not wait for its threads; call `shutdown()` to stop and join them.
pub struct Server {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl Server {
    /// Bind `config.address` and start the acceptor and worker threads.
    /// `registry` is shared read-only by every worker for the server's
    /// lifetime.
    pub fn start(config: ServerConfig, registry: Arc<HandlerRegistry>) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.address)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = sync_channel::<TcpStream>(config.worker_threads.max(1) * 2);
        let rx = Arc::new(Mutex::new(rx));

        let acceptor_stop = stop.clone();
        let acceptor = thread::spawn(move || {
            loop {
                if acceptor_stop.load(Ordering::SeqCst) {
                    break;
                }
                match listener.accept() {
                    Ok((stream, _addr)) => {
                        if tx.send(stream).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        thread::sleep(ACCEPT_POLL_INTERVAL);
                    }
                    Err(e) => warn!("error accepting connection: {e}"),
                }
            }
            // Dropping `tx` here closes the channel, which is how idle
            // workers learn to stop once every already-queued connection has
            // drained.
        });

        let mut workers = Vec::with_capacity(config.worker_threads.max(1));
        for id in 0..config.worker_threads.max(1) {
            let rx = rx.clone();
            let registry = registry.clone();
            let read_idle = config.read_idle;
            workers.push(thread::spawn(move || worker_loop(id, rx, registry, read_idle)));
        }

        Ok(Self {
            local_addr,
            stop,
            acceptor: Some(acceptor),
            workers,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections and join every thread, letting
    /// in-flight handlers finish first. Joins the acceptor before any worker.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.acceptor.take() {
            let _ = handle.join();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(id: usize, rx: Arc<Mutex<Receiver<TcpStream>>>, registry: Arc<HandlerRegistry>, read_idle: Duration) {
    loop {
        let next = {
            let rx = rx.lock().expect("worker channel poisoned");
            rx.recv()
        };
        let Ok(stream) = next else {
            break;
        };
        if let Err(e) = handle_connection(stream, &registry, read_idle) {
            warn!("worker {id}: connection closed: {e}");
        }
    }
}

/// One request per connection: decode exactly one `RpcRequest`, dispatch it,
/// write back exactly one `RpcResponse`, then return and let the connection
/// drop.
fn handle_connection(mut stream: TcpStream, registry: &HandlerRegistry, read_idle: Duration) -> Result<(), RpcError> {
    stream.set_read_timeout(Some(read_idle))?;

    let mut decoder = MessageDecoder::<RpcRequest>::new();
    let mut buf = [0u8; 4096];

    let request = loop {
        if let Some(request) = decoder.decode_next()? {
            break request;
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        decoder.feed(&buf[..n]);
    };

    let response = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| dispatcher::dispatch(registry, request))) {
        Ok(response) => response,
        Err(_) => {
            error!("handler panicked while processing request");
            return Ok(());
        }
    };

    let framed = encode_message(&response)?;
    stream.write_all(&framed)?;
    stream.flush()?;
    Ok(())
}
