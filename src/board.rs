//! Abstract bulletin board (§4.3): a multi-writer, append-only,
//! authenticated channel parties exchange protocol messages over.
//!
//! This crate ships one concrete implementation — an in-memory, thread-safe
//! board suitable for tests and for driving several `Session`s inside one
//! process — behind the same trait a networked implementation would
//! satisfy. It uses `std::sync::{Mutex, Condvar}` rather than an async
//! runtime: the protocol's concurrency model (§5) is single-thread-of-
//! control-per-session with blocking suspension at `waitFor`, which a
//! condvar expresses directly.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::byte_tree::ByteTree;

/// `publish`/`waitFor`/`isActive` contract relied on by `Session`.
///
/// Ordering guarantee: within a session, messages are delivered in the
/// order `publish` was called for a given label by each party.
/// Cancellation is cooperative — a pending `wait_for` may be aborted
/// externally, in which case the core treats it as `is_active == false`.
pub trait Board {
    /// Append this party's authenticated message under `(party, label)`.
    fn publish(&self, party: usize, label: &str, payload: ByteTree);

    /// Block until a message under `(party, label)` is available, then
    /// return it. `None` means the wait was cancelled externally.
    fn wait_for(&self, party: usize, label: &str) -> Option<ByteTree>;

    /// Snapshot of liveness at session start.
    fn is_active(&self, party: usize) -> bool;
}

#[derive(Default)]
struct Inner {
    messages: HashMap<(usize, String), ByteTree>,
    active: HashMap<usize, bool>,
    cancelled: HashMap<(usize, String), bool>,
}

/// Reference in-memory board. Clone to share a handle to the same
/// underlying board across threads/parties.
#[derive(Clone)]
pub struct InMemoryBoard {
    inner: Arc<(Mutex<Inner>, Condvar)>,
}

impl Default for InMemoryBoard {
    fn default() -> Self {
        InMemoryBoard {
            inner: Arc::new((Mutex::new(Inner::default()), Condvar::new())),
        }
    }
}

impl InMemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a party inactive (absent) for the lifetime of this board,
    /// simulating §8 scenario S2/S5.
    pub fn set_active(&self, party: usize, active: bool) {
        let (lock, condvar) = &*self.inner;
        let mut inner = lock.lock().expect("board mutex poisoned");
        inner.active.insert(party, active);
        condvar.notify_all();
    }

    /// Cancel a pending or future `wait_for(party, label)`, simulating an
    /// externally aborted wait (§5).
    pub fn cancel(&self, party: usize, label: &str) {
        let (lock, condvar) = &*self.inner;
        let mut inner = lock.lock().expect("board mutex poisoned");
        inner.cancelled.insert((party, label.to_string()), true);
        condvar.notify_all();
    }
}

impl Board for InMemoryBoard {
    fn publish(&self, party: usize, label: &str, payload: ByteTree) {
        let (lock, condvar) = &*self.inner;
        let mut inner = lock.lock().expect("board mutex poisoned");
        inner.messages.insert((party, label.to_string()), payload);
        inner.active.entry(party).or_insert(true);
        condvar.notify_all();
    }

    fn wait_for(&self, party: usize, label: &str) -> Option<ByteTree> {
        let (lock, condvar) = &*self.inner;
        let mut inner = lock.lock().expect("board mutex poisoned");
        let key = (party, label.to_string());
        loop {
            if *inner.cancelled.get(&key).unwrap_or(&false) {
                return None;
            }
            if let Some(payload) = inner.messages.get(&key) {
                return Some(payload.clone());
            }
            if !*inner.active.get(&party).unwrap_or(&true) {
                return None;
            }
            inner = condvar.wait(inner).expect("board mutex poisoned");
        }
    }

    fn is_active(&self, party: usize) -> bool {
        let (lock, _) = &*self.inner;
        let inner = lock.lock().expect("board mutex poisoned");
        *inner.active.get(&party).unwrap_or(&true)
    }
}
