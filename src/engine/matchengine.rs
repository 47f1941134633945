//! Transaction-level state machine over the matcher.
//!
//! The host chain hands the engine bincode-encoded commands in block order.
//! The engine decodes them, enforces per-block capacity, stamps the logical
//! clock, and returns execution receipts for inclusion in block results.
//! Full engine state serializes to a snapshot that restores bit-identically
//! on every replica.

use serde::{Deserialize, Serialize};

use crate::engine::entry::{Order, Trade};
use crate::engine::matchlogic::{BookSnapshot, Matcher, SubmitStatus};
use crate::errors::EngineError;
use crate::genesis::{Genesis, GenesisError, Rules};
use crate::metrics;

/// The kind of action carried by a transaction.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineCmdType {
    /// Submit a new order for matching
    #[default]
    AddOrder,
    /// Cancel a resting order
    CancelOrder,
}

/// Wire form of a transaction payload.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EngineCmd {
    pub cmd: EngineCmdType,
    /// Order data for `AddOrder`
    pub order: Option<Order>,
    /// Target id for `CancelOrder`
    pub order_id: Option<String>,
}

impl EngineCmd {
    pub fn add_order(order: Order) -> Self {
        Self {
            cmd: EngineCmdType::AddOrder,
            order: Some(order),
            order_id: None,
        }
    }

    pub fn cancel_order(order_id: impl Into<String>) -> Self {
        Self {
            cmd: EngineCmdType::CancelOrder,
            order: None,
            order_id: Some(order_id.into()),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap()
    }
}

/// Outcome of one executed transaction, surfaced to the host for block
/// results and event streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxReceipt {
    OrderPlaced {
        trades: Vec<Trade>,
        status: SubmitStatus,
    },
    OrderCancelled {
        order: Order,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchEngine {
    matcher: Matcher,
    rules: Rules,
    block_height: u64,
    block_txs: u32,
}

impl MatchEngine {
    pub fn new(rules: Rules) -> Self {
        metrics::init_registry();
        Self {
            matcher: Matcher::new(),
            rules,
            block_height: 0,
            block_txs: 0,
        }
    }

    /// Build an engine from genesis: validates the config and plays the
    /// initial orders through the normal submit path. A rejected initial
    /// order fails construction.
    pub fn from_genesis(genesis: &Genesis) -> Result<Self, GenesisError> {
        genesis.validate()?;
        let mut engine = Self::new(genesis.rules());
        for order in genesis.orders()? {
            let id = order.id.clone();
            engine.submit(order).map_err(|err| {
                GenesisError::InvalidConfig(format!("initial order '{}' rejected: {}", id, err))
            })?;
        }
        // seeding does not count against the first block
        engine.block_txs = 0;
        Ok(engine)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Reset per-block accounting. The host calls this at every block
    /// boundary before applying the block's transactions.
    pub fn begin_block(&mut self, height: u64) {
        self.block_height = height;
        self.block_txs = 0;
    }

    /// Decode and execute one transaction payload.
    pub fn execute(&mut self, data: &[u8]) -> Result<TxReceipt, EngineError> {
        let cmd: EngineCmd = bincode::deserialize(data).map_err(|err| {
            log::error!("failed to decode transaction: {}", err);
            EngineError::MalformedTransaction
        })?;
        match cmd.cmd {
            EngineCmdType::AddOrder => {
                let order = cmd.order.ok_or(EngineError::MalformedTransaction)?;
                self.submit(order)
            }
            EngineCmdType::CancelOrder => {
                let order_id = cmd.order_id.ok_or(EngineError::MalformedTransaction)?;
                self.cancel(&order_id)
            }
        }
    }

    pub fn submit(&mut self, order: Order) -> Result<TxReceipt, EngineError> {
        self.check_capacity()?;
        let (trades, status) = self.matcher.place_order(order)?;
        self.block_txs += 1;
        metrics::ADD_ORDER_COUNTER.inc();
        if !trades.is_empty() {
            metrics::MATCH_ORDER_COUNTER.inc_by(trades.len() as f64);
        }
        Ok(TxReceipt::OrderPlaced { trades, status })
    }

    pub fn cancel(&mut self, order_id: &str) -> Result<TxReceipt, EngineError> {
        self.check_capacity()?;
        let order = self.matcher.cancel_order(order_id)?;
        self.block_txs += 1;
        metrics::CANCEL_ORDER_COUNTER.inc();
        log::debug!("cancelled order {}", order_id);
        Ok(TxReceipt::OrderCancelled { order })
    }

    pub fn get_order(&self, order_id: &str) -> Result<&Order, EngineError> {
        self.matcher.get_order(order_id)
    }

    pub fn orders_by_owner(&self, owner: &str) -> Vec<Order> {
        self.matcher.orders_by_owner(owner)
    }

    pub fn book_snapshot(&self) -> BookSnapshot {
        self.matcher.book_snapshot()
    }

    /// Serialized engine state as a byte vector.
    pub fn snapshot(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap()
    }

    /// Restores engine state from a snapshot.
    pub fn on_snapshot(&mut self, data: &[u8]) {
        match bincode::deserialize(data) {
            Ok(engine) => *self = engine,
            Err(err) => {
                log::error!("failed to deserialize match engine: {}", err);
            }
        }
    }

    fn check_capacity(&self) -> Result<(), EngineError> {
        let max = self.rules.max_block_txs;
        if max > 0 && self.block_txs >= max {
            return Err(EngineError::BlockCapacityExceeded);
        }
        Ok(())
    }
}
