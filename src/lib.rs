//! # nanobook-core
//!
//! A deterministic, single-symbol, price-time-priority limit order book
//! matching engine core for high-frequency-trading simulations.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns the order book exclusively (no locks)
//! - **O(1) Operations**: Submit, cancel, and match all run in constant time
//! - **Cache-Optimized**: 64-byte aligned nodes, 32-bit arena indices
//! - **Arena Allocation**: No heap allocation in the hot path
//!
//! ## Architecture
//!
//! ```text
//! [Ingress] --> [SPSC Ring Buffer] --> [Engine Thread (Pinned)] --> [Output Events]
//! ```
//!
//! The four subsystems live in their own modules: [`arena`] (the object
//! pool), [`price_level`] (the intrusive FIFO queue), [`order_book`] +
//! [`matching`] (the two price-ordered sides and the cross loop), and
//! [`ring_buffer`] (the SPSC hand-off). [`engine`] wires them together;
//! the optional [`shared`] module (behind the `shared` feature) offers a
//! coarse-lock multi-producer alternative to the SPSC deployment.

pub mod arena;
pub mod command;
pub mod engine;
pub mod matching;
pub mod order_book;
pub mod price_level;
pub mod ring_buffer;

#[cfg(feature = "shared")]
pub mod shared;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NULL_INDEX};
pub use command::{
    BookUpdate, CancelOrder, Command, OutputEvent, PlaceOrder, RejectReason, Side, TradeEvent,
};
pub use engine::Engine;
pub use matching::MatchingEngine;
pub use order_book::OrderBook;
pub use price_level::PriceLevel;
pub use ring_buffer::{Consumer, Producer, RingBuffer, RingRequest};

#[cfg(feature = "shared")]
pub use shared::SharedEngine;
