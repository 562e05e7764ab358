//! Order Book - The central limit order book data structure.
//!
//! Maintains bid and ask price levels with O(1) best-price access
//! and O(1) order lookup for cancellation. Price levels are kept in
//! a sorted map so the book can be walked in strict price order for
//! the cross loop and for snapshotting; only the identifier index
//! uses a hash map, since no ordering is required there.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use crate::arena::{Arena, ArenaIndex};
use crate::command::Side;
use crate::price_level::PriceLevel;

/// Mapping from OrderId to ArenaIndex for O(1) cancel lookup
pub type OrderMap = FxHashMap<u64, ArenaIndex>;

/// Order metadata stored alongside the arena index
#[derive(Clone, Copy, Debug)]
pub struct OrderInfo {
    /// Index in the arena
    pub arena_index: ArenaIndex,
    /// Order side (needed for cancel to find correct book side)
    pub side: Side,
    /// Price level (needed for cancel to find the PriceLevel)
    pub price: u64,
    /// Opaque trader tag, carried for event attribution only.
    pub trader_tag: u64,
}

/// The two-sided book: a price-ordered map of levels per side plus an
/// identifier index for O(1) cancel lookup.
///
/// Bids and asks are kept in `BTreeMap`s keyed by price so that the
/// cross loop and snapshot iteration both see strictly monotonic price
/// order without a sort step. The identifier index has no ordering
/// requirement and stays a fast hash map.
pub struct OrderBook {
    /// Bid price levels (buy orders), ascending by price
    pub bids: BTreeMap<u64, PriceLevel>,
    /// Ask price levels (sell orders), ascending by price
    pub asks: BTreeMap<u64, PriceLevel>,
    /// Cached best bid price (highest buy price)
    best_bid: Option<u64>,
    /// Cached best ask price (lowest sell price)
    best_ask: Option<u64>,
    /// Order lookup map: OrderId -> OrderInfo
    order_map: FxHashMap<u64, OrderInfo>,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            best_bid: None,
            best_ask: None,
            order_map: FxHashMap::default(),
        }
    }

    /// Create a new order book with pre-allocated identifier index capacity.
    /// The side maps are trees and have no meaningful pre-sizing.
    pub fn with_capacity(_levels: usize, orders: usize) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            best_bid: None,
            best_ask: None,
            order_map: FxHashMap::with_capacity_and_hasher(orders, Default::default()),
        }
    }

    // ========================================================================
    // Best Price Access
    // ========================================================================

    /// Get the best bid price (highest buy price)
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.best_bid
    }

    /// Get the best ask price (lowest sell price)
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.best_ask
    }

    /// Get the best price on a given side
    #[inline]
    pub fn best_price(&self, side: Side) -> Option<u64> {
        match side {
            Side::Bid => self.best_bid,
            Side::Ask => self.best_ask,
        }
    }

    /// Get the best opposite price (for matching)
    #[inline]
    pub fn best_opposite_price(&self, side: Side) -> Option<u64> {
        match side {
            Side::Bid => self.best_ask,  // Buyer matches with lowest ask
            Side::Ask => self.best_bid,  // Seller matches with highest bid
        }
    }

    // ========================================================================
    // Level Access
    // ========================================================================

    /// Get a price level (immutable)
    #[inline]
    pub fn get_level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        match side {
            Side::Bid => self.bids.get(&price),
            Side::Ask => self.asks.get(&price),
        }
    }

    /// Get a price level (mutable)
    #[inline]
    pub fn get_level_mut(&mut self, side: Side, price: u64) -> Option<&mut PriceLevel> {
        match side {
            Side::Bid => self.bids.get_mut(&price),
            Side::Ask => self.asks.get_mut(&price),
        }
    }

    /// Get or create a price level
    #[inline]
    pub fn get_or_create_level(&mut self, side: Side, price: u64) -> &mut PriceLevel {
        match side {
            Side::Bid => self.bids.entry(price).or_insert_with(PriceLevel::new),
            Side::Ask => self.asks.entry(price).or_insert_with(PriceLevel::new),
        }
    }

    // ========================================================================
    // Ordered iteration (book snapshots, display, cross-checking)
    // ========================================================================

    /// Bid levels from best (highest price) to worst.
    #[inline]
    pub fn bids_best_first(&self) -> impl DoubleEndedIterator<Item = (&u64, &PriceLevel)> {
        self.bids.iter().rev()
    }

    /// Ask levels from best (lowest price) to worst.
    #[inline]
    pub fn asks_best_first(&self) -> impl DoubleEndedIterator<Item = (&u64, &PriceLevel)> {
        self.asks.iter()
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Add an order to the book.
    ///
    /// # Arguments
    /// * `arena` - The arena containing order nodes
    /// * `order_id` - External order ID
    /// * `side` - Order side
    /// * `price` - Order price
    /// * `arena_index` - Index of the order in the arena
    ///
    /// # Returns
    /// `true` if order was added, `false` if order_id already exists
    pub fn add_order(
        &mut self,
        arena: &mut Arena,
        order_id: u64,
        trader_tag: u64,
        side: Side,
        price: u64,
        arena_index: ArenaIndex,
    ) -> bool {
        // Check for duplicate order ID
        if self.order_map.contains_key(&order_id) {
            return false;
        }

        // Add to order lookup map
        self.order_map.insert(order_id, OrderInfo {
            arena_index,
            side,
            price,
            trader_tag,
        });

        // Add to price level
        let level = self.get_or_create_level(side, price);
        level.push_back(arena, arena_index);

        // Update best price cache
        self.update_best_price_on_add(side, price);

        true
    }

    /// Remove an order from the book (for cancel).
    ///
    /// # Arguments
    /// * `arena` - The arena containing order nodes
    /// * `order_id` - External order ID to remove
    ///
    /// # Returns
    /// The removed order's info if found, or `None` if not found
    pub fn remove_order(&mut self, arena: &mut Arena, order_id: u64) -> Option<OrderInfo> {
        // Look up order
        let info = self.order_map.remove(&order_id)?;

        // Remove from price level
        let level = match info.side {
            Side::Bid => self.bids.get_mut(&info.price),
            Side::Ask => self.asks.get_mut(&info.price),
        };

        if let Some(level) = level {
            let is_empty = level.remove(arena, info.arena_index);

            // Clean up empty level and update best price
            if is_empty {
                self.remove_empty_level(info.side, info.price);
            }
        }

        Some(info)
    }

    /// Look up an order by ID.
    #[inline]
    pub fn get_order(&self, order_id: u64) -> Option<&OrderInfo> {
        self.order_map.get(&order_id)
    }

    /// Check if an order exists.
    #[inline]
    pub fn contains_order(&self, order_id: u64) -> bool {
        self.order_map.contains_key(&order_id)
    }

    /// Remove an order from the order map only (after matching).
    /// Call this when an order is fully filled during matching.
    #[inline]
    pub fn remove_order_from_map(&mut self, order_id: u64) {
        self.order_map.remove(&order_id);
    }

    // ========================================================================
    // Level Removal
    // ========================================================================

    /// Remove an empty price level and update best price if needed.
    pub fn remove_empty_level(&mut self, side: Side, price: u64) {
        match side {
            Side::Bid => {
                self.bids.remove(&price);
                if self.best_bid == Some(price) {
                    self.recalculate_best_bid();
                }
            }
            Side::Ask => {
                self.asks.remove(&price);
                if self.best_ask == Some(price) {
                    self.recalculate_best_ask();
                }
            }
        }
    }

    // ========================================================================
    // Best Price Management
    // ========================================================================

    /// Update best price cache when adding an order.
    fn update_best_price_on_add(&mut self, side: Side, price: u64) {
        match side {
            Side::Bid => {
                if self.best_bid.map_or(true, |best| price > best) {
                    self.best_bid = Some(price);
                }
            }
            Side::Ask => {
                if self.best_ask.map_or(true, |best| price < best) {
                    self.best_ask = Some(price);
                }
            }
        }
    }

    /// Recalculate best bid price after the current best level emptied out.
    fn recalculate_best_bid(&mut self) {
        self.best_bid = self.bids.keys().next_back().copied();
    }

    /// Recalculate best ask price after the current best level emptied out.
    fn recalculate_best_ask(&mut self) {
        self.best_ask = self.asks.keys().next().copied();
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get the total number of orders in the book
    pub fn order_count(&self) -> usize {
        self.order_map.len()
    }

    /// Get the number of bid levels
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Get the number of ask levels
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Check if the book is empty
    pub fn is_empty(&self) -> bool {
        self.order_map.is_empty()
    }

    /// Clear all orders from the book
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.best_bid = None;
        self.best_ask = None;
        self.order_map.clear();
    }

    /// Calculate spread (best_ask - best_bid)
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Get depth at a price level
    pub fn depth_at(&self, side: Side, price: u64) -> (u64, u32) {
        self.get_level(side, price)
            .map(|l| (l.total_qty, l.count))
            .unwrap_or((0, 0))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid)
            .field("best_ask", &self.best_ask)
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.order_map.len())
            .finish()
    }
}
