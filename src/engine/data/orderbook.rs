//! The order book: both sides plus an id index over one shared arena.
//!
//! The arena uniquely owns every resting order; sides and the id index hold
//! arena keys. Serialization goes through a canonical wire form holding the
//! logical state only, so snapshots of books with identical order history
//! are byte-identical no matter how arena slots or heap entries happen to
//! be laid out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::engine::data::queue::OrderNode;
use crate::engine::data::side::BookSide;
use crate::engine::entry::{Order, OrderSide};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "PersistedBook", from = "PersistedBook")]
pub struct OrderBook {
    pub(crate) orders: Slab<OrderNode>,
    pub(crate) bids: BookSide,
    pub(crate) asks: BookSide,
    pub(crate) by_id: BTreeMap<String, usize>,
}

/// Canonical wire form: every resting order, bids then asks, levels in
/// ascending price order, oldest first within a level. Restoring replays
/// the orders through the normal insertion path, which also compacts the
/// arena and rebuilds the price heaps without stale entries.
#[derive(Serialize, Deserialize)]
struct PersistedBook {
    orders: Vec<Order>,
}

impl From<OrderBook> for PersistedBook {
    fn from(book: OrderBook) -> Self {
        let mut orders = Vec::with_capacity(book.by_id.len());
        for side in [&book.bids, &book.asks] {
            for level in side.levels.values() {
                orders.extend(level.orders.iter(&book.orders).map(|node| node.order.clone()));
            }
        }
        PersistedBook { orders }
    }
}

impl From<PersistedBook> for OrderBook {
    fn from(persisted: PersistedBook) -> Self {
        let mut book = OrderBook::new();
        for order in persisted.orders {
            book.add_limit_order(order);
        }
        book
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            orders: Slab::new(),
            bids: BookSide::new(OrderSide::Buy),
            asks: BookSide::new(OrderSide::Sell),
            by_id: BTreeMap::new(),
        }
    }

    /// Number of resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.by_id.contains_key(order_id)
    }

    pub fn get_order(&self, order_id: &str) -> Option<&Order> {
        self.by_id
            .get(order_id)
            .and_then(|key| self.orders.get(*key))
            .map(|node| &node.order)
    }

    /// Rest a limit order on its own side and index it by id.
    pub fn add_limit_order(&mut self, order: Order) -> usize {
        let id = order.id.clone();
        let side = order.side;
        log::debug!("resting order {} at {} for {}", id, order.price, order.quantity);
        let key = self.orders.insert(OrderNode::new(order));
        self.by_id.insert(id, key);
        match side {
            OrderSide::Buy => self.bids.insert(key, &mut self.orders),
            OrderSide::Sell => self.asks.insert(key, &mut self.orders),
        }
        key
    }

    /// Unlink an order from its level queue and drop it from the book.
    /// The level disappears with its last order.
    pub fn remove_order(&mut self, order_id: &str) -> Option<Order> {
        let key = self.by_id.remove(order_id)?;
        let (side, price, quantity) = {
            let node = self.orders.get(key).expect("indexed order missing");
            (node.order.side, node.order.price, node.order.quantity)
        };
        let book_side = match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };
        let mut drained = false;
        if let Some(level) = book_side.level_mut(price) {
            level.orders.remove(key, &mut self.orders);
            level.total_quantity = level.total_quantity.saturating_sub(quantity);
            drained = level.is_empty();
        }
        if drained {
            book_side.remove_level(price);
        }
        Some(self.orders.remove(key).order)
    }

    pub fn best_bid(&mut self) -> Option<u64> {
        self.bids.best_price()
    }

    pub fn best_ask(&mut self) -> Option<u64> {
        self.asks.best_price()
    }

    /// Aggregated `(price, quantity)` ladders in priority order.
    pub fn depth(&self) -> (Vec<(u64, u64)>, Vec<(u64, u64)>) {
        (self.bids.depth(), self.asks.depth())
    }
}
