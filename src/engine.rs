//! Engine - Main event loop with CPU pinning and warm-up.
//!
//! Wraps the matching engine with I/O handling via the crate's own
//! SPSC ring buffer: one for inbound requests, one for outbound events.

use crate::command::{CancelOrder, Command, OutputEvent, PlaceOrder};
use crate::matching::MatchingEngine;
use crate::ring_buffer::{Consumer, Producer, RingRequest};

/// The main engine that processes commands from a ring buffer.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
}

impl Engine {
    /// Create a new engine with the specified order capacity.
    pub fn new(capacity: u32) -> Self {
        Self {
            matcher: MatchingEngine::new(capacity),
        }
    }

    /// Run the engine event loop.
    ///
    /// # Arguments
    /// * `input` - Consumer end of the request ring buffer
    /// * `output` - Producer end of the output event ring buffer
    /// * `pin_to_core` - Whether to pin to the last available CPU core
    ///
    /// # Note
    /// This function runs forever (until the program terminates).
    pub fn run(
        &mut self,
        input: &Consumer<'_, RingRequest>,
        output: &Producer<'_, OutputEvent>,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            self.pin_to_core();
        }

        self.warm_up();

        loop {
            while let Some(request) = input.pop() {
                let events = self.process_request(request);
                for event in events {
                    // Best effort - drop if the output side is saturated.
                    let _ = output.push(event);
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Process a single wire-format request and return output events.
    #[inline]
    pub fn process_request(&mut self, request: RingRequest) -> Vec<OutputEvent> {
        if request.is_submit {
            self.matcher.process_place(PlaceOrder {
                order_id: request.order_id,
                trader_tag: request.trader_tag,
                side: request.side,
                price: request.price,
                qty: request.qty,
            })
        } else {
            self.matcher.process_cancel(CancelOrder {
                order_id: request.order_id,
            })
        }
    }

    /// Process a single command and return output events.
    ///
    /// This is the main entry point for synchronous usage (testing, benchmarks).
    #[inline]
    pub fn process_command(&mut self, cmd: Command) -> Vec<OutputEvent> {
        match cmd {
            Command::Place(order) => self.matcher.process_place(order),
            Command::Cancel(cancel) => self.matcher.process_cancel(cancel),
        }
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            if let Some(last_core) = core_ids.last() {
                core_affinity::set_for_current(*last_core);
            }
        }
    }

    /// Warm up the engine by pre-faulting memory pages.
    pub fn warm_up(&mut self) {
        self.matcher.warm_up();
    }

    /// Get the best bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.matcher.best_bid()
    }

    /// Get the best ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.matcher.best_ask()
    }

    /// Get the spread.
    #[inline]
    pub fn spread(&self) -> Option<u64> {
        self.matcher.spread()
    }

    /// Get total order count.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.matcher.order_count()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(1_000_000) // 1M orders default capacity
    }
}
