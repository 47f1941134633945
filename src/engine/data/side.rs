//! One side of the book: price levels indexed by price plus a priority
//! queue over prices.
//!
//! The heap is a max-heap over bid prices and a min-heap over ask prices,
//! so its root is always the most aggressive live price. Arbitrary removal
//! uses lazy deletion: dropping a level only removes it from `levels`, and
//! stale heap entries are swept when they surface at the root. A heap entry
//! is live iff its price is still a key of `levels`.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use slab::Slab;

use crate::engine::data::queue::{OrderNode, OrderQueue};
use crate::engine::entry::OrderSide;

/// All resting orders at a single price, oldest first.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: u64,
    pub total_quantity: u64,
    pub orders: OrderQueue,
}

impl PriceLevel {
    fn new(price: u64) -> Self {
        Self {
            price,
            total_quantity: 0,
            orders: OrderQueue::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Max-heap for the buy side, min-heap for the sell side.
#[derive(Debug, Clone)]
enum PriceHeap {
    Bids(BinaryHeap<u64>),
    Asks(BinaryHeap<Reverse<u64>>),
}

impl PriceHeap {
    fn push(&mut self, price: u64) {
        match self {
            PriceHeap::Bids(heap) => heap.push(price),
            PriceHeap::Asks(heap) => heap.push(Reverse(price)),
        }
    }

    fn peek(&self) -> Option<u64> {
        match self {
            PriceHeap::Bids(heap) => heap.peek().copied(),
            PriceHeap::Asks(heap) => heap.peek().map(|entry| entry.0),
        }
    }

    fn pop(&mut self) -> Option<u64> {
        match self {
            PriceHeap::Bids(heap) => heap.pop(),
            PriceHeap::Asks(heap) => heap.pop().map(|entry| entry.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookSide {
    side: OrderSide,
    pub(crate) levels: BTreeMap<u64, PriceLevel>,
    prices: PriceHeap,
}

impl BookSide {
    pub fn new(side: OrderSide) -> Self {
        let prices = match side {
            OrderSide::Buy => PriceHeap::Bids(BinaryHeap::new()),
            OrderSide::Sell => PriceHeap::Asks(BinaryHeap::new()),
        };
        Self {
            side,
            levels: BTreeMap::new(),
            prices,
        }
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, price: u64) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: u64) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Append an order to its price level, creating the level on first use.
    pub fn insert(&mut self, key: usize, arena: &mut Slab<OrderNode>) {
        let (price, quantity) = {
            let node = arena.get(key).expect("unknown order key");
            (node.order.price, node.order.quantity)
        };
        if !self.levels.contains_key(&price) {
            self.levels.insert(price, PriceLevel::new(price));
            self.prices.push(price);
        }
        let level = self.levels.get_mut(&price).expect("level just inserted");
        level.orders.push_back(key, arena);
        level.total_quantity = level.total_quantity.saturating_add(quantity);
    }

    /// Best live price. Stale entries left behind by removed levels are
    /// swept here, so the amortized cost stays O(log P).
    pub fn best_price(&mut self) -> Option<u64> {
        while let Some(price) = self.prices.peek() {
            if self.levels.contains_key(&price) {
                return Some(price);
            }
            self.prices.pop();
        }
        None
    }

    /// Drop a level from the index. Its heap entry goes stale and is
    /// reclaimed by a later `best_price`.
    pub fn remove_level(&mut self, price: u64) -> Option<PriceLevel> {
        self.levels.remove(&price)
    }

    /// Account for a partial fill against the level at `price`.
    pub fn reduce(&mut self, price: u64, quantity: u64) {
        if let Some(level) = self.levels.get_mut(&price) {
            level.total_quantity = level.total_quantity.saturating_sub(quantity);
        }
    }

    /// Aggregate resting quantity across all levels.
    pub fn total_quantity(&self) -> u64 {
        self.levels
            .values()
            .fold(0u64, |acc, level| acc.saturating_add(level.total_quantity))
    }

    /// `(price, aggregate quantity)` pairs in priority order.
    pub fn depth(&self) -> Vec<(u64, u64)> {
        match self.side {
            OrderSide::Buy => self
                .levels
                .iter()
                .rev()
                .map(|(price, level)| (*price, level.total_quantity))
                .collect(),
            OrderSide::Sell => self
                .levels
                .iter()
                .map(|(price, level)| (*price, level.total_quantity))
                .collect(),
        }
    }
}
