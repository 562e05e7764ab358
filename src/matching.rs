//! Matching Engine - Core order matching algorithm.
//!
//! Implements the cross/rest algorithm:
//! 1. CROSSING: Match the incoming order against the opposite side first
//! 2. RESTING: Post whatever quantity remains into the book
//!
//! Because crossing always happens before the incoming order joins its
//! own side, the maker/taker distinction in a trade is unambiguous by
//! construction: the maker is always the order already resting in the
//! book, so execution price is always the maker's price.

use tracing::{error, trace};

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::command::{
    BookUpdate, CancelOrder, OutputEvent, PlaceOrder, Side, TradeEvent,
    OrderAccepted, OrderCanceled, OrderRejected, RejectReason,
};
use crate::order_book::OrderBook;

/// The matching engine core: the arena-backed order pool plus the
/// two-sided book built on top of it.
pub struct MatchingEngine {
    /// Memory arena for order nodes
    pub arena: Arena,
    /// The limit order book
    pub book: OrderBook,
}

impl MatchingEngine {
    /// Create a new matching engine with the specified capacity
    pub fn new(capacity: u32) -> Self {
        Self {
            arena: Arena::new(capacity),
            book: OrderBook::with_capacity(1000, capacity as usize),
        }
    }

    /// Process a place order command.
    ///
    /// # Algorithm
    /// 1. Reject zero-quantity submissions
    /// 2. Silently drop a duplicate order id (no event emitted at all)
    /// 3. Cross against the opposite side
    /// 4. Rest whatever quantity remains
    ///
    /// # Returns
    /// Vector of output events (trades, book updates, etc.)
    pub fn process_place(&mut self, order: PlaceOrder) -> Vec<OutputEvent> {
        let mut events = Vec::new();

        if order.qty == 0 {
            events.push(OutputEvent::Rejected(OrderRejected {
                order_id: order.order_id,
                reason: RejectReason::InvalidQuantity,
            }));
            return events;
        }

        // A duplicate identifier produces no event at all: the caller
        // already "owns" that id and resubmitting it is assumed to be a
        // caller-side bug, not something worth a reported rejection.
        if self.book.contains_order(order.order_id) {
            return events;
        }

        let mut remaining_qty = order.qty;

        // Phase 1: CROSSING (aggressive matching) - always happens first
        remaining_qty = self.cross_order(&order, remaining_qty, &mut events);

        // Phase 2: RESTING (passive posting)
        if remaining_qty > 0 {
            if self.rest_order(&order, remaining_qty, &mut events).is_none() {
                events.push(OutputEvent::Rejected(OrderRejected {
                    order_id: order.order_id,
                    reason: RejectReason::PoolExhausted,
                }));
            }
        }

        events
    }

    /// Cross (match) an incoming order against the opposite side.
    ///
    /// # Returns
    /// Remaining quantity after matching
    fn cross_order(
        &mut self,
        order: &PlaceOrder,
        mut remaining_qty: u64,
        events: &mut Vec<OutputEvent>,
    ) -> u64 {
        let opposite_side = order.side.opposite();

        loop {
            if remaining_qty == 0 {
                break;
            }

            // Get best opposite price
            let best_opposite = match self.book.best_opposite_price(order.side) {
                Some(price) => price,
                None => break, // No orders on opposite side
            };

            // Check if price crosses
            if !self.prices_cross(order.price, best_opposite, order.side) {
                break;
            }

            // Match against orders at this level
            remaining_qty = self.match_at_level(
                order,
                best_opposite,
                opposite_side,
                remaining_qty,
                events,
            );
        }

        remaining_qty
    }

    /// Check if an incoming order price crosses the opposite best price.
    #[inline]
    fn prices_cross(&self, order_price: u64, opposite_best: u64, order_side: Side) -> bool {
        match order_side {
            // Buyer willing to pay >= lowest ask
            Side::Bid => order_price >= opposite_best,
            // Seller willing to accept <= highest bid
            Side::Ask => order_price <= opposite_best,
        }
    }

    /// Match against all orders at a specific price level.
    ///
    /// # Returns
    /// Remaining quantity after matching at this level
    fn match_at_level(
        &mut self,
        taker: &PlaceOrder,
        price: u64,
        maker_side: Side,
        mut remaining_qty: u64,
        events: &mut Vec<OutputEvent>,
    ) -> u64 {
        loop {
            if remaining_qty == 0 {
                break;
            }

            // Get the price level
            let level = match self.book.get_level_mut(maker_side, price) {
                Some(l) => l,
                None => break,
            };

            if level.is_empty() {
                break;
            }

            // Get head order (oldest = highest priority)
            let maker_idx = level.peek_head();
            if maker_idx == NULL_INDEX {
                self.invariant_violation("price level non-empty but head index is NULL");
            }

            // Get maker order details
            let maker = self.arena.get(maker_idx);
            let maker_order_id = maker.order_id;
            let maker_trader_tag = maker.trader_tag;
            let maker_qty = maker.qty;

            // Calculate trade quantity - execution price is always the
            // maker's (passive, resting) price.
            let trade_qty = remaining_qty.min(maker_qty);

            events.push(OutputEvent::Trade(TradeEvent {
                price,
                qty: trade_qty,
                maker_order_id,
                taker_order_id: taker.order_id,
                maker_trader_tag,
                taker_trader_tag: taker.trader_tag,
                taker_side: taker.side,
            }));
            trace!(maker_order_id, taker_order_id = taker.order_id, price, qty = trade_qty, "trade");

            // Update quantities
            remaining_qty -= trade_qty;
            let new_maker_qty = maker_qty - trade_qty;

            if new_maker_qty == 0 {
                // Maker fully filled - remove from book
                let level = self.book.get_level_mut(maker_side, price).unwrap();
                level.pop_front(&mut self.arena);
                self.book.remove_order_from_map(maker_order_id);
                self.arena.free(maker_idx);

                // Check if level is now empty
                let level = self.book.get_level(maker_side, price);
                if level.map_or(true, |l| l.is_empty()) {
                    events.push(OutputEvent::BookDelta(BookUpdate {
                        side: maker_side,
                        price,
                        new_qty: 0,
                        new_count: 0,
                    }));
                    self.book.remove_empty_level(maker_side, price);
                } else {
                    let level = self.book.get_level(maker_side, price).unwrap();
                    events.push(OutputEvent::BookDelta(BookUpdate {
                        side: maker_side,
                        price,
                        new_qty: level.total_qty,
                        new_count: level.count,
                    }));
                }
            } else {
                // Maker partially filled - update quantity and cached aggregate
                self.arena.get_mut(maker_idx).qty = new_maker_qty;

                let level = self.book.get_level_mut(maker_side, price).unwrap();
                level.subtract_qty(trade_qty);

                events.push(OutputEvent::BookDelta(BookUpdate {
                    side: maker_side,
                    price,
                    new_qty: level.total_qty,
                    new_count: level.count,
                }));
            }
        }

        remaining_qty
    }

    /// Rest an order in the book (passive posting).
    ///
    /// # Returns
    /// Arena index of the new order, or `None` if the pool is exhausted
    fn rest_order(
        &mut self,
        order: &PlaceOrder,
        qty: u64,
        events: &mut Vec<OutputEvent>,
    ) -> Option<ArenaIndex> {
        let arena_idx = self.arena.alloc()?;

        let node = self.arena.get_mut(arena_idx);
        node.order_id = order.order_id;
        node.trader_tag = order.trader_tag;
        node.price = order.price;
        node.qty = qty;

        self.book.add_order(
            &mut self.arena,
            order.order_id,
            order.trader_tag,
            order.side,
            order.price,
            arena_idx,
        );

        events.push(OutputEvent::Accepted(OrderAccepted {
            order_id: order.order_id,
            price: order.price,
            qty,
            side: order.side,
        }));

        let level = self.book.get_level(order.side, order.price).unwrap();
        events.push(OutputEvent::BookDelta(BookUpdate {
            side: order.side,
            price: order.price,
            new_qty: level.total_qty,
            new_count: level.count,
        }));

        Some(arena_idx)
    }

    /// Process a cancel order command.
    ///
    /// # Returns
    /// Vector of output events
    pub fn process_cancel(&mut self, cancel: CancelOrder) -> Vec<OutputEvent> {
        let mut events = Vec::new();

        let info = match self.book.get_order(cancel.order_id) {
            Some(info) => *info,
            None => {
                events.push(OutputEvent::Rejected(OrderRejected {
                    order_id: cancel.order_id,
                    reason: RejectReason::UnknownIdentifier,
                }));
                return events;
            }
        };

        let canceled_qty = self.arena.get(info.arena_index).qty;

        self.book.remove_order(&mut self.arena, cancel.order_id);
        self.arena.free(info.arena_index);

        events.push(OutputEvent::Canceled(OrderCanceled {
            order_id: cancel.order_id,
            canceled_qty,
        }));

        let (new_qty, new_count) = self.book.depth_at(info.side, info.price);
        events.push(OutputEvent::BookDelta(BookUpdate {
            side: info.side,
            price: info.price,
            new_qty,
            new_count,
        }));

        events
    }

    /// Abort on an internal state inconsistency that must never happen
    /// in a correctly-operating engine. Logs at error level before
    /// panicking so the diagnostic survives even in release builds
    /// where `debug_assert!` itself is compiled out.
    #[cold]
    #[inline(never)]
    fn invariant_violation(&self, message: &str) -> ! {
        error!(%message, "invariant violation");
        panic!("matching engine invariant violation: {message}");
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get the best bid price
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.book.best_bid()
    }

    /// Get the best ask price
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.book.best_ask()
    }

    /// Get the spread
    #[inline]
    pub fn spread(&self) -> Option<u64> {
        self.book.spread()
    }

    /// Get total order count
    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Warm up the engine (pre-fault memory pages)
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Compute a hash of the current state (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.book.best_bid().hash(&mut hasher);
        self.book.best_ask().hash(&mut hasher);
        self.book.order_count().hash(&mut hasher);
        self.arena.allocated().hash(&mut hasher);

        hasher.finish()
    }
}
