//! Prometheus counters for executed order-book actions.

use lazy_static::lazy_static;
use prometheus::{Counter, Registry};

lazy_static! {
    /// Global Prometheus registry instance
    pub static ref REGISTRY_INSTANCE: Registry = Registry::new();

    /// Counts accepted add-order transactions
    pub static ref ADD_ORDER_COUNTER: Counter = Counter::new(
        "orderbook_add_order_total",
        "Total number of AddOrder actions executed"
    )
    .unwrap();

    /// Counts accepted cancel-order transactions
    pub static ref CANCEL_ORDER_COUNTER: Counter = Counter::new(
        "orderbook_cancel_order_total",
        "Total number of CancelOrder actions executed"
    )
    .unwrap();

    /// Counts emitted trades
    pub static ref MATCH_ORDER_COUNTER: Counter = Counter::new(
        "orderbook_match_order_total",
        "Total number of matches executed"
    )
    .unwrap();
}

/// Registers all collectors with the global registry. Safe to call more
/// than once; duplicate registrations are ignored.
pub fn init_registry() {
    let _ = REGISTRY_INSTANCE.register(Box::new(ADD_ORDER_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(CANCEL_ORDER_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(MATCH_ORDER_COUNTER.clone()));
}
