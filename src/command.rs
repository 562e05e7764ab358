//! Command and Event types for the matching engine.
//!
//! Commands are inputs from the producer side of the ring buffer.
//! Events are outputs to market data / execution report consumers.

use serde::{Deserialize, Serialize};

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

// ============================================================================
// Input Commands
// ============================================================================

/// Place a new limit order
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PlaceOrder {
    /// External order ID (client-assigned)
    pub order_id: u64,
    /// Opaque trader tag, carried through to output events only
    pub trader_tag: u64,
    /// Order side (bid/ask)
    pub side: Side,
    /// Fixed-point price (e.g., $100.50 -> 10050000)
    pub price: u64,
    /// Order quantity
    pub qty: u64,
}

impl PlaceOrder {
    /// Create a new resting limit order.
    #[inline]
    pub const fn limit(order_id: u64, trader_tag: u64, side: Side, price: u64, qty: u64) -> Self {
        Self {
            order_id,
            trader_tag,
            side,
            price,
            qty,
        }
    }
}

/// Cancel an existing order
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CancelOrder {
    /// Order ID to cancel
    pub order_id: u64,
}

/// Input commands carried across the ring buffer
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Command {
    /// Place a new limit order
    Place(PlaceOrder),
    /// Cancel an existing order
    Cancel(CancelOrder),
}

// ============================================================================
// Output Events
// ============================================================================

/// A trade was executed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Execution price - always the passive (resting) side's price
    pub price: u64,
    /// Executed quantity
    pub qty: u64,
    /// Maker (passive) order ID
    pub maker_order_id: u64,
    /// Taker (aggressive) order ID
    pub taker_order_id: u64,
    /// Maker trader tag
    pub maker_trader_tag: u64,
    /// Taker trader tag
    pub taker_trader_tag: u64,
    /// Side of the taker order
    pub taker_side: Side,
}

/// Order book level update (Level 2 market data)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    /// Which side changed
    pub side: Side,
    /// Price level that changed
    pub price: u64,
    /// New total quantity at this price (0 = level removed)
    pub new_qty: u64,
    /// New order count at this price
    pub new_count: u32,
}

/// Order was accepted and is resting in the book
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub order_id: u64,
    pub price: u64,
    pub qty: u64,
    pub side: Side,
}

/// Order was canceled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    pub order_id: u64,
    /// Remaining quantity that was canceled
    pub canceled_qty: u64,
}

/// Order was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub order_id: u64,
    pub reason: RejectReason,
}

/// Reasons a submit/cancel can be rejected (reported, non-fatal errors).
///
/// A duplicate identifier is deliberately absent from this enum: per the
/// silent-error policy, a duplicate submit produces no event at all, so
/// there is no `OrderRejected` to carry a reason for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[repr(u8)]
pub enum RejectReason {
    /// Order not found (for cancel)
    #[error("order not found")]
    UnknownIdentifier = 0,
    /// Pool is at capacity
    #[error("order pool exhausted")]
    PoolExhausted = 1,
    /// Quantity must be greater than zero
    #[error("quantity must be greater than zero")]
    InvalidQuantity = 2,
}

/// Output events from the matching engine
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum OutputEvent {
    /// Trade executed
    Trade(TradeEvent),
    /// Book level changed
    BookDelta(BookUpdate),
    /// Order accepted and resting
    Accepted(OrderAccepted),
    /// Order canceled
    Canceled(OrderCanceled),
    /// Order rejected
    Rejected(OrderRejected),
}
