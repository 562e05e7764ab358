//! Coarse-lock multi-producer wrapper around the engine.
//!
//! Not part of the hot single-writer core: the SPSC ring buffer and a
//! pinned engine thread remain the intended deployment shape. This
//! wrapper exists for embedding scenarios where dedicating a core to
//! the matching engine is impractical (tests, simulations, small
//! tools) and several threads need to submit concurrently.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::{CancelOrder, OutputEvent, PlaceOrder};
use crate::matching::MatchingEngine;

/// A `MatchingEngine` behind a mutex, safe to share across threads via
/// cheap `Arc` clones.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<MatchingEngine>>,
}

impl SharedEngine {
    /// Create a new shared engine with the given order pool capacity.
    pub fn new(capacity: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MatchingEngine::new(capacity))),
        }
    }

    /// Submit a new order, taking the lock for the duration of matching.
    pub fn submit(&self, order: PlaceOrder) -> Vec<OutputEvent> {
        self.inner.lock().process_place(order)
    }

    /// Cancel an existing order, taking the lock for the duration.
    pub fn cancel(&self, cancel: CancelOrder) -> Vec<OutputEvent> {
        self.inner.lock().process_cancel(cancel)
    }

    /// Best bid price, if any.
    pub fn best_bid(&self) -> Option<u64> {
        self.inner.lock().best_bid()
    }

    /// Best ask price, if any.
    pub fn best_ask(&self) -> Option<u64> {
        self.inner.lock().best_ask()
    }

    /// Current resting order count.
    pub fn order_count(&self) -> usize {
        self.inner.lock().order_count()
    }
}
