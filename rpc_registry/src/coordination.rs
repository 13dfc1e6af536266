// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The capability surface the registry/discovery layer needs from a
//! coordination backend (existence checks, persistent/ephemeral node
//! creation, children listing, session lifetime), plus an in-process
//! reference implementation of it.
//!
//! A production deployment would implement [`CoordinationClient`] against a
//! real distributed, persistent coordination service; that implementation is
//! out of scope here (§1), but this is exactly the seam it would plug into.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
pub enum CoordinationError {
    NotFound(String),
    AlreadyExists(String),
    InvalidPath(String),
}

impl fmt::Display for CoordinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "no such node: {path}"),
            Self::AlreadyExists(path) => write!(f, "node already exists: {path}"),
            Self::InvalidPath(path) => write!(f, "invalid path: {path}"),
        }
    }
}

impl std::error::Error for CoordinationError {}

/// The capability surface consumed by [`crate::registry::RegistryClient`] and
/// [`crate::discovery::DiscoveryClient`].
pub trait CoordinationClient: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn create_persistent(&self, path: &str) -> Result<(), CoordinationError>;
    fn create_ephemeral_sequential(
        &self,
        parent: &str,
        payload: &[u8],
        session_id: u64,
    ) -> Result<String, CoordinationError>;
    fn get_children(&self, path: &str) -> Result<Vec<String>, CoordinationError>;
    fn read_data(&self, path: &str) -> Result<Vec<u8>, CoordinationError>;

    /// Begin a new session; returns an opaque id used to tag ephemeral nodes.
    fn new_session_id(&self) -> u64;

    /// End a session: every ephemeral node it owns is removed. Persistent
    /// nodes are never touched by this call.
    fn end_session(&self, session_id: u64);
}

#[derive(Default)]
struct Node {
    persistent: bool,
    payload: Vec<u8>,
    owner_session: Option<u64>,
}

#[derive(Default)]
struct Tree {
    nodes: HashMap<String, Node>,
    sessions: HashMap<u64, HashSet<String>>,
}

/// An in-process stand-in for a real coordination service. Sufficient to
/// drive registration, discovery, and the ephemeral-cleanup tests; session
/// end is explicit (drop/`close()`) rather than timer-driven, since there is
/// no network between "client" and "server" to lose a heartbeat over.
pub struct LocalCoordinationService {
    tree: Mutex<Tree>,
    next_session: AtomicU64,
    next_sequence: AtomicU64,
    #[allow(dead_code)]
    session_timeout: Duration,
    #[allow(dead_code)]
    connection_timeout: Duration,
}

impl LocalCoordinationService {
    pub fn new(session_timeout: Duration, connection_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            tree: Mutex::new(Tree::default()),
            next_session: AtomicU64::new(1),
            next_sequence: AtomicU64::new(1),
            session_timeout,
            connection_timeout,
        })
    }

    /// Open a session against this service. Dropping the returned
    /// [`CoordinationSession`] (or calling `.close()`) ends it.
    pub fn open_session(self: &Arc<Self>) -> CoordinationSession {
        let id = self.new_session_id();
        CoordinationSession {
            client: self.clone(),
            id,
            closed: false,
        }
    }
}

impl CoordinationClient for LocalCoordinationService {
    fn exists(&self, path: &str) -> bool {
        self.tree.lock().expect("tree poisoned").nodes.contains_key(path)
    }

    fn create_persistent(&self, path: &str) -> Result<(), CoordinationError> {
        let mut tree = self.tree.lock().expect("tree poisoned");
        tree.nodes.entry(path.to_string()).or_insert_with(|| Node {
            persistent: true,
            payload: Vec::new(),
            owner_session: None,
        });
        Ok(())
    }

    fn create_ephemeral_sequential(
        &self,
        parent: &str,
        payload: &[u8],
        session_id: u64,
    ) -> Result<String, CoordinationError> {
        let mut tree = self.tree.lock().expect("tree poisoned");
        if !tree.nodes.contains_key(parent) {
            return Err(CoordinationError::NotFound(parent.to_string()));
        }

        let seq = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let child_path = format!("{parent}/address-{seq:010}");

        tree.nodes.insert(
            child_path.clone(),
            Node {
                persistent: false,
                payload: payload.to_vec(),
                owner_session: Some(session_id),
            },
        );
        tree.sessions
            .entry(session_id)
            .or_default()
            .insert(child_path.clone());

        Ok(child_path)
    }

    fn get_children(&self, path: &str) -> Result<Vec<String>, CoordinationError> {
        let tree = self.tree.lock().expect("tree poisoned");
        if !tree.nodes.contains_key(path) {
            return Err(CoordinationError::NotFound(path.to_string()));
        }

        let prefix = format!("{path}/");
        let mut children: Vec<String> = tree
            .nodes
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(|rest| rest.to_string())
            .collect();
        children.sort();
        Ok(children)
    }

    fn read_data(&self, path: &str) -> Result<Vec<u8>, CoordinationError> {
        let tree = self.tree.lock().expect("tree poisoned");
        tree.nodes
            .get(path)
            .map(|node| node.payload.clone())
            .ok_or_else(|| CoordinationError::NotFound(path.to_string()))
    }

    fn new_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::SeqCst)
    }

    fn end_session(&self, session_id: u64) {
        let mut tree = self.tree.lock().expect("tree poisoned");
        if let Some(owned) = tree.sessions.remove(&session_id) {
            for path in owned {
                tree.nodes.remove(&path);
            }
        }
    }
}

/// A handle to a single session against a coordination client. Ephemeral
/// nodes created through this handle disappear when it is dropped or
/// explicitly closed.
pub struct CoordinationSession {
    client: Arc<dyn CoordinationClient>,
    id: u64,
    closed: bool,
}

impl CoordinationSession {
    pub fn exists(&self, path: &str) -> bool {
        self.client.exists(path)
    }

    pub fn create_persistent(&self, path: &str) -> Result<(), CoordinationError> {
        self.client.create_persistent(path)
    }

    pub fn create_ephemeral_sequential(
        &self,
        parent: &str,
        payload: &[u8],
    ) -> Result<String, CoordinationError> {
        self.client.create_ephemeral_sequential(parent, payload, self.id)
    }

    pub fn get_children(&self, path: &str) -> Result<Vec<String>, CoordinationError> {
        self.client.get_children(path)
    }

    pub fn read_data(&self, path: &str) -> Result<Vec<u8>, CoordinationError> {
        self.client.read_data(path)
    }

    /// End the session explicitly, removing every ephemeral node it owns.
    pub fn close(mut self) {
        self.client.end_session(self.id);
        self.closed = true;
    }
}

impl Drop for CoordinationSession {
    fn drop(&mut self) {
        if !self.closed {
            self.client.end_session(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_node_disappears_when_session_ends() {
        let service = LocalCoordinationService::new(Duration::from_secs(5), Duration::from_secs(1));
        let session = service.open_session();
        session.create_persistent("/registry").unwrap();
        session.create_persistent("/registry/Foo").unwrap();
        let child = session
            .create_ephemeral_sequential("/registry/Foo", b"127.0.0.1:1")
            .unwrap();

        assert_eq!(session.get_children("/registry/Foo").unwrap().len(), 1);

        session.close();

        assert!(service.exists("/registry/Foo"));
        assert!(!service.exists(&child));
    }

    #[test]
    fn persistent_nodes_are_idempotent() {
        let service = LocalCoordinationService::new(Duration::from_secs(5), Duration::from_secs(1));
        let session = service.open_session();
        session.create_persistent("/registry").unwrap();
        session.create_persistent("/registry").unwrap();
        assert!(session.exists("/registry"));
    }
}
