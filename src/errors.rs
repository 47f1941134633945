use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the matching engine. Every failed operation leaves
/// book state exactly as it was; the host decides whether the failed
/// transaction is still recorded in the block.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineError {
    #[error("order not found")]
    OrderNotFound,

    #[error("duplicate order id")]
    DuplicateOrderId,

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("market order could not be fully matched")]
    MarketOrderUnfilled,

    #[error("max block transactions reached")]
    BlockCapacityExceeded,

    #[error("malformed transaction payload")]
    MalformedTransaction,
}
