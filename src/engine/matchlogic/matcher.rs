use serde::{Deserialize, Serialize};

use crate::engine::data::OrderBook;
use crate::engine::entry::{Order, OrderSide, OrderType, Trade};
use crate::errors::EngineError;

/// Terminal outcome of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitStatus {
    /// Fully matched; nothing rested.
    Filled,
    /// Matched in part; the residual now rests on its own side.
    PartiallyFilled { resting: Order },
    /// No match; the whole order now rests.
    Resting { order: Order },
}

/// Point-in-time aggregated view of resting liquidity, materialized by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookSnapshot {
    pub bids: Vec<(u64, u64)>,
    pub asks: Vec<(u64, u64)>,
}

/// Matches incoming orders against the book.
///
/// All failures are detected before any mutation, so a rejected submission
/// leaves the book untouched. Market orders are all-or-nothing: opposite
/// side liquidity is summed up front and the order is rejected outright if
/// it cannot fill completely. `clock` is the logical sequence stamped on
/// accepted orders and emitted trades; wall time never enters the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Matcher {
    book: OrderBook,
    clock: u64,
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
            clock: 0,
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Match an incoming order, then rest any limit residual.
    pub fn place_order(
        &mut self,
        mut order: Order,
    ) -> Result<(Vec<Trade>, SubmitStatus), EngineError> {
        self.validate(&order)?;
        if order.order_type == OrderType::Market {
            // the price field carries no meaning for market orders
            order.price = 0;
            let available = match order.side {
                OrderSide::Buy => self.book.asks.total_quantity(),
                OrderSide::Sell => self.book.bids.total_quantity(),
            };
            if available < order.quantity {
                return Err(EngineError::MarketOrderUnfilled);
            }
        }
        self.clock += 1;
        order.sequence = self.clock;

        let trades = self.match_incoming(&mut order);

        let status = if order.quantity == 0 {
            SubmitStatus::Filled
        } else {
            debug_assert_eq!(order.order_type, OrderType::Limit);
            let resting = order.clone();
            self.book.add_limit_order(order);
            if trades.is_empty() {
                SubmitStatus::Resting { order: resting }
            } else {
                SubmitStatus::PartiallyFilled { resting }
            }
        };
        Ok((trades, status))
    }

    /// Remove a resting order. Ids of fully matched orders are unknown.
    pub fn cancel_order(&mut self, order_id: &str) -> Result<Order, EngineError> {
        self.book
            .remove_order(order_id)
            .ok_or(EngineError::OrderNotFound)
    }

    pub fn get_order(&self, order_id: &str) -> Result<&Order, EngineError> {
        self.book
            .get_order(order_id)
            .ok_or(EngineError::OrderNotFound)
    }

    /// Resting orders belonging to `owner`, in arrival order.
    pub fn orders_by_owner(&self, owner: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .book
            .by_id
            .values()
            .filter_map(|key| self.book.orders.get(*key))
            .map(|node| node.order.clone())
            .filter(|order| order.owner == owner)
            .collect();
        orders.sort_by_key(|order| order.sequence);
        orders
    }

    pub fn book_snapshot(&self) -> BookSnapshot {
        let (bids, asks) = self.book.depth();
        BookSnapshot { bids, asks }
    }

    fn validate(&self, order: &Order) -> Result<(), EngineError> {
        if order.id.is_empty() {
            return Err(EngineError::InvalidOrder("empty order id".to_string()));
        }
        if self.book.contains(&order.id) {
            return Err(EngineError::DuplicateOrderId);
        }
        if order.quantity == 0 {
            return Err(EngineError::InvalidOrder("zero quantity".to_string()));
        }
        if order.order_type == OrderType::Limit && order.price == 0 {
            return Err(EngineError::InvalidOrder(
                "limit order with zero price".to_string(),
            ));
        }
        Ok(())
    }

    fn crosses(side: OrderSide, limit_price: u64, best: u64) -> bool {
        match side {
            OrderSide::Buy => best <= limit_price,
            OrderSide::Sell => best >= limit_price,
        }
    }

    /// Walk the opposite side from the best price inward, consuming maker
    /// orders head-first. Trade prices are the makers' resting prices.
    fn match_incoming(&mut self, taker: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        let book = &mut self.book;
        while taker.quantity > 0 {
            let opposite = match taker.side {
                OrderSide::Buy => &mut book.asks,
                OrderSide::Sell => &mut book.bids,
            };
            let Some(best) = opposite.best_price() else {
                break;
            };
            if taker.order_type == OrderType::Limit
                && !Self::crosses(taker.side, taker.price, best)
            {
                break;
            }
            let Some(head_key) = opposite.level(best).and_then(|level| level.orders.front())
            else {
                break;
            };

            let Some(maker) = book.orders.get_mut(head_key) else {
                break;
            };
            let fill = taker.quantity.min(maker.order.quantity);
            maker.order.quantity -= fill;
            taker.quantity -= fill;
            let maker_id = maker.order.id.clone();
            let maker_filled = maker.order.quantity == 0;

            self.clock += 1;
            trades.push(Trade {
                maker_order_id: maker_id.clone(),
                taker_order_id: taker.id.clone(),
                price: best,
                quantity: fill,
                sequence: self.clock,
            });
            log::debug!(
                "matched {} against {} for {} at {}",
                taker.id,
                maker_id,
                fill,
                best
            );

            let opposite = match taker.side {
                OrderSide::Buy => &mut book.asks,
                OrderSide::Sell => &mut book.bids,
            };
            opposite.reduce(best, fill);
            if maker_filled {
                let mut drained = false;
                if let Some(level) = opposite.level_mut(best) {
                    let popped = level.orders.pop_front(&mut book.orders);
                    debug_assert_eq!(popped, Some(head_key));
                    drained = level.is_empty();
                }
                if drained {
                    opposite.remove_level(best);
                }
                book.orders.remove(head_key);
                book.by_id.remove(&maker_id);
            }
        }
        trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(id: &str, side: OrderSide, price: u64, quantity: u64) -> Order {
        Order::limit(id, "", side, price, quantity)
    }

    /// Walk the whole book and assert the structural invariants: id-index
    /// consistency, per-order positivity, level bookkeeping, heap root
    /// agreement, and the no-cross property.
    fn check_invariants(matcher: &mut Matcher) {
        let mut queued = 0usize;
        for side in [OrderSide::Buy, OrderSide::Sell] {
            let book_side = match side {
                OrderSide::Buy => &matcher.book.bids,
                OrderSide::Sell => &matcher.book.asks,
            };
            for (price, level) in &book_side.levels {
                assert!(!level.is_empty(), "empty level survived at {}", price);
                assert_eq!(level.price, *price);
                queued += level.orders.len();
                let head_key = level.orders.front().unwrap();
                let head = &matcher.book.orders[head_key].order;
                assert_eq!(head.side, side);
                assert_eq!(head.price, *price);
            }
        }
        assert_eq!(matcher.book.by_id.len(), queued);

        for (id, key) in &matcher.book.by_id {
            let order = &matcher.book.orders[*key].order;
            assert_eq!(&order.id, id);
            assert!(order.quantity > 0);
            let book_side = match order.side {
                OrderSide::Buy => &matcher.book.bids,
                OrderSide::Sell => &matcher.book.asks,
            };
            assert!(book_side.levels.contains_key(&order.price));
        }

        let top_bid = matcher.book.bids.levels.keys().next_back().copied();
        let top_ask = matcher.book.asks.levels.keys().next().copied();
        assert_eq!(matcher.book.best_bid(), top_bid);
        assert_eq!(matcher.book.best_ask(), top_ask);
        if let (Some(bid), Some(ask)) = (top_bid, top_ask) {
            assert!(bid < ask, "book crossed: {} >= {}", bid, ask);
        }
    }

    #[test]
    fn empty_book_limit_rests() {
        let mut matcher = Matcher::new();
        let (trades, status) = matcher
            .place_order(limit("a", OrderSide::Buy, 100, 10))
            .unwrap();

        assert!(trades.is_empty());
        assert!(matches!(status, SubmitStatus::Resting { .. }));
        let snapshot = matcher.book_snapshot();
        assert_eq!(snapshot.bids, vec![(100, 10)]);
        assert!(snapshot.asks.is_empty());
        check_invariants(&mut matcher);
    }

    #[test]
    fn full_fill_single_maker() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Buy, 100, 10))
            .unwrap();
        let (trades, status) = matcher
            .place_order(limit("b", OrderSide::Sell, 100, 10))
            .unwrap();

        assert_eq!(status, SubmitStatus::Filled);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, "a");
        assert_eq!(trades[0].taker_order_id, "b");
        assert_eq!(trades[0].price, 100);
        assert_eq!(trades[0].quantity, 10);

        let snapshot = matcher.book_snapshot();
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.asks.is_empty());
        assert_eq!(matcher.book.order_count(), 0);
        check_invariants(&mut matcher);
    }

    #[test]
    fn partial_fill_residual_rests() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Buy, 100, 10))
            .unwrap();
        let (trades, status) = matcher
            .place_order(limit("c", OrderSide::Sell, 100, 15))
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, "a");
        assert_eq!(trades[0].quantity, 10);
        match status {
            SubmitStatus::PartiallyFilled { resting } => {
                assert_eq!(resting.id, "c");
                assert_eq!(resting.quantity, 5);
            }
            other => panic!("expected partial fill, got {:?}", other),
        }

        let snapshot = matcher.book_snapshot();
        assert!(snapshot.bids.is_empty());
        assert_eq!(snapshot.asks, vec![(100, 5)]);
        check_invariants(&mut matcher);
    }

    #[test]
    fn price_time_priority_within_level() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Buy, 100, 5))
            .unwrap();
        matcher
            .place_order(limit("b", OrderSide::Buy, 100, 5))
            .unwrap();
        let (trades, _) = matcher
            .place_order(limit("c", OrderSide::Sell, 100, 7))
            .unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].maker_order_id, "a");
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(trades[1].maker_order_id, "b");
        assert_eq!(trades[1].quantity, 2);

        let snapshot = matcher.book_snapshot();
        assert_eq!(snapshot.bids, vec![(100, 3)]);
        assert!(snapshot.asks.is_empty());
        assert_eq!(matcher.get_order("b").unwrap().quantity, 3);
        check_invariants(&mut matcher);
    }

    #[test]
    fn market_order_walks_book_at_maker_prices() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("x", OrderSide::Sell, 101, 3))
            .unwrap();
        matcher
            .place_order(limit("y", OrderSide::Sell, 102, 4))
            .unwrap();
        let (trades, status) = matcher
            .place_order(Order::market("m", "", OrderSide::Buy, 5))
            .unwrap();

        assert_eq!(status, SubmitStatus::Filled);
        assert_eq!(trades.len(), 2);
        assert_eq!(
            (trades[0].maker_order_id.as_str(), trades[0].price, trades[0].quantity),
            ("x", 101, 3)
        );
        assert_eq!(
            (trades[1].maker_order_id.as_str(), trades[1].price, trades[1].quantity),
            ("y", 102, 2)
        );

        let snapshot = matcher.book_snapshot();
        assert!(snapshot.bids.is_empty());
        assert_eq!(snapshot.asks, vec![(102, 2)]);
        assert!(!matcher.book.contains("m"));
        check_invariants(&mut matcher);
    }

    #[test]
    fn unfillable_market_order_leaves_book_untouched() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("x", OrderSide::Sell, 101, 3))
            .unwrap();
        let before = bincode::serialize(&matcher.book).unwrap();

        let err = matcher
            .place_order(Order::market("m", "", OrderSide::Buy, 5))
            .unwrap_err();
        assert_eq!(err, EngineError::MarketOrderUnfilled);

        assert_eq!(bincode::serialize(&matcher.book).unwrap(), before);
        let snapshot = matcher.book_snapshot();
        assert_eq!(snapshot.asks, vec![(101, 3)]);
        assert!(matcher.book.contains("x"));
        check_invariants(&mut matcher);
    }

    #[test]
    fn market_order_against_empty_book_is_rejected() {
        let mut matcher = Matcher::new();
        let err = matcher
            .place_order(Order::market("m", "", OrderSide::Sell, 1))
            .unwrap_err();
        assert_eq!(err, EngineError::MarketOrderUnfilled);
    }

    #[test]
    fn crossing_limit_sweeps_multiple_levels() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("x", OrderSide::Sell, 101, 3))
            .unwrap();
        matcher
            .place_order(limit("y", OrderSide::Sell, 102, 4))
            .unwrap();
        matcher
            .place_order(limit("z", OrderSide::Sell, 105, 4))
            .unwrap();
        let (trades, status) = matcher
            .place_order(limit("b", OrderSide::Buy, 102, 10))
            .unwrap();

        // sweeps 101 and 102, stops at 105, rests the remainder
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, 101);
        assert_eq!(trades[1].price, 102);
        match status {
            SubmitStatus::PartiallyFilled { resting } => assert_eq!(resting.quantity, 3),
            other => panic!("expected partial fill, got {:?}", other),
        }
        let snapshot = matcher.book_snapshot();
        assert_eq!(snapshot.bids, vec![(102, 3)]);
        assert_eq!(snapshot.asks, vec![(105, 4)]);
        check_invariants(&mut matcher);
    }

    #[test]
    fn round_trip_submit_then_cancel_restores_book() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Buy, 99, 10))
            .unwrap();
        let before = bincode::serialize(&matcher.book).unwrap();

        matcher
            .place_order(limit("b", OrderSide::Buy, 100, 4))
            .unwrap();
        let cancelled = matcher.cancel_order("b").unwrap();
        assert_eq!(cancelled.quantity, 4);

        assert_eq!(bincode::serialize(&matcher.book).unwrap(), before);
        check_invariants(&mut matcher);
    }

    #[test]
    fn cancel_after_full_fill_is_not_found() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Buy, 100, 10))
            .unwrap();
        matcher
            .place_order(limit("b", OrderSide::Sell, 100, 10))
            .unwrap();

        let before = bincode::serialize(&matcher.book).unwrap();
        assert_eq!(matcher.cancel_order("a").unwrap_err(), EngineError::OrderNotFound);
        assert_eq!(matcher.cancel_order("b").unwrap_err(), EngineError::OrderNotFound);
        assert_eq!(bincode::serialize(&matcher.book).unwrap(), before);
    }

    #[test]
    fn duplicate_resting_id_is_rejected() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Buy, 100, 10))
            .unwrap();
        let err = matcher
            .place_order(limit("a", OrderSide::Buy, 101, 5))
            .unwrap_err();
        assert_eq!(err, EngineError::DuplicateOrderId);
        check_invariants(&mut matcher);
    }

    #[test]
    fn invalid_orders_are_rejected() {
        let mut matcher = Matcher::new();
        assert!(matches!(
            matcher.place_order(limit("a", OrderSide::Buy, 100, 0)),
            Err(EngineError::InvalidOrder(_))
        ));
        assert!(matches!(
            matcher.place_order(limit("b", OrderSide::Buy, 0, 10)),
            Err(EngineError::InvalidOrder(_))
        ));
        assert!(matches!(
            matcher.place_order(limit("", OrderSide::Buy, 100, 10)),
            Err(EngineError::InvalidOrder(_))
        ));
        assert!(matcher.book.is_empty());
    }

    #[test]
    fn trade_sequences_are_strictly_increasing() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(limit("a", OrderSide::Sell, 100, 5))
            .unwrap();
        matcher
            .place_order(limit("b", OrderSide::Sell, 101, 5))
            .unwrap();
        let (trades, _) = matcher
            .place_order(limit("c", OrderSide::Buy, 101, 10))
            .unwrap();

        assert_eq!(trades.len(), 2);
        assert!(trades[0].sequence < trades[1].sequence);
    }

    #[test]
    fn orders_by_owner_in_arrival_order() {
        let mut matcher = Matcher::new();
        matcher
            .place_order(Order::limit("a", "alice", OrderSide::Buy, 100, 1))
            .unwrap();
        matcher
            .place_order(Order::limit("b", "bob", OrderSide::Buy, 99, 1))
            .unwrap();
        matcher
            .place_order(Order::limit("c", "alice", OrderSide::Sell, 110, 1))
            .unwrap();

        let mine = matcher.orders_by_owner("alice");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, "a");
        assert_eq!(mine[1].id, "c");
        assert!(matcher.orders_by_owner("carol").is_empty());
    }
}
