//! Genesis configuration for the matching engine VM.
//!
//! Genesis fixes the chain-wide numeric grid (tick and lot size), the block
//! transaction budget, and an optional set of orders seeded into the book at
//! initialization. Prices and quantities appear here as decimals; the one
//! decimal-to-integer conversion in the system happens at this boundary, and
//! the engine beyond it is integer-only.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::entry::{Order, OrderSide, OrderType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    #[error("invalid genesis config: {0}")]
    InvalidConfig(String),

    #[error("duplicate initial order id '{0}'")]
    DuplicateInitialOrder(String),
}

/// An order seeded into the book at chain initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialOrder {
    pub id: String,
    #[serde(default)]
    pub owner: String,
    /// "buy" or "sell"
    pub side: String,
    /// Decimal price; 0 for market orders
    pub price: Decimal,
    /// Decimal quantity
    pub quantity: Decimal,
    /// "limit" or "market"
    pub order_type: String,
}

/// Chain-wide parameters fixed at genesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genesis {
    /// Maximum transactions accepted per block; 0 disables the check
    pub max_block_txs: u32,
    /// Minimum price increment
    pub tick_size: Decimal,
    /// Minimum quantity increment
    pub lot_size: Decimal,
    #[serde(default)]
    pub initial_orders: Vec<InitialOrder>,
}

impl Default for Genesis {
    fn default() -> Self {
        Self {
            max_block_txs: 1000,
            tick_size: dec!(0.01),
            lot_size: dec!(0.001),
            initial_orders: vec![
                InitialOrder {
                    id: "init_buy_1".to_string(),
                    owner: String::new(),
                    side: "buy".to_string(),
                    price: dec!(100.0),
                    quantity: dec!(50),
                    order_type: "limit".to_string(),
                },
                InitialOrder {
                    id: "init_sell_1".to_string(),
                    owner: String::new(),
                    side: "sell".to_string(),
                    price: dec!(101.0),
                    quantity: dec!(50),
                    order_type: "limit".to_string(),
                },
            ],
        }
    }
}

impl Genesis {
    /// Parse and validate a TOML genesis document.
    pub fn parse(contents: &str) -> Result<Self, GenesisError> {
        let genesis: Genesis =
            toml::from_str(contents).map_err(|err| GenesisError::InvalidConfig(err.to_string()))?;
        genesis.validate()?;
        Ok(genesis)
    }

    /// Load from a TOML file. An unreadable file falls back to defaults;
    /// a file that parses but fails validation is an error.
    pub fn from_toml(path: &str) -> Result<Self, GenesisError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("could not read genesis file {}: {}", path, err);
                return Ok(Self::default());
            }
        };
        Self::parse(&contents)
    }

    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.max_block_txs == 0 {
            return Err(GenesisError::InvalidConfig(
                "max_block_txs must be positive".to_string(),
            ));
        }
        if self.tick_size <= Decimal::ZERO {
            return Err(GenesisError::InvalidConfig(
                "tick_size must be positive".to_string(),
            ));
        }
        if self.lot_size <= Decimal::ZERO {
            return Err(GenesisError::InvalidConfig(
                "lot_size must be positive".to_string(),
            ));
        }
        let mut ids = HashSet::new();
        for order in &self.initial_orders {
            if order.side != "buy" && order.side != "sell" {
                return Err(GenesisError::InvalidConfig(format!(
                    "invalid side '{}' for order '{}'",
                    order.side, order.id
                )));
            }
            if order.order_type != "limit" && order.order_type != "market" {
                return Err(GenesisError::InvalidConfig(format!(
                    "invalid order type '{}' for order '{}'",
                    order.order_type, order.id
                )));
            }
            if !ids.insert(order.id.as_str()) {
                return Err(GenesisError::DuplicateInitialOrder(order.id.clone()));
            }
        }
        Ok(())
    }

    /// The immutable view the engine reads at construction.
    pub fn rules(&self) -> Rules {
        Rules {
            max_block_txs: self.max_block_txs,
            tick_size: self.tick_size,
            lot_size: self.lot_size,
        }
    }

    /// Convert a decimal price to ticks. The price must sit on the grid.
    pub fn price_to_ticks(&self, price: Decimal) -> Result<u64, GenesisError> {
        Self::to_units(price, self.tick_size).ok_or_else(|| {
            GenesisError::InvalidConfig(format!(
                "price {} is not a multiple of tick size {}",
                price, self.tick_size
            ))
        })
    }

    /// Convert a decimal quantity to lots. The quantity must sit on the grid.
    pub fn quantity_to_lots(&self, quantity: Decimal) -> Result<u64, GenesisError> {
        Self::to_units(quantity, self.lot_size).ok_or_else(|| {
            GenesisError::InvalidConfig(format!(
                "quantity {} is not a multiple of lot size {}",
                quantity, self.lot_size
            ))
        })
    }

    fn to_units(value: Decimal, step: Decimal) -> Option<u64> {
        if value < Decimal::ZERO || step <= Decimal::ZERO {
            return None;
        }
        let units = value / step;
        if !units.fract().is_zero() {
            return None;
        }
        units.to_u64()
    }

    /// Engine orders for the configured initial book.
    pub fn orders(&self) -> Result<Vec<Order>, GenesisError> {
        let mut orders = Vec::with_capacity(self.initial_orders.len());
        for entry in &self.initial_orders {
            let side = match entry.side.as_str() {
                "buy" => OrderSide::Buy,
                "sell" => OrderSide::Sell,
                other => {
                    return Err(GenesisError::InvalidConfig(format!(
                        "invalid side '{}'",
                        other
                    )))
                }
            };
            let order_type = match entry.order_type.as_str() {
                "limit" => OrderType::Limit,
                "market" => OrderType::Market,
                other => {
                    return Err(GenesisError::InvalidConfig(format!(
                        "invalid order type '{}'",
                        other
                    )))
                }
            };
            orders.push(Order {
                id: entry.id.clone(),
                owner: entry.owner.clone(),
                side,
                order_type,
                price: self.price_to_ticks(entry.price)?,
                quantity: self.quantity_to_lots(entry.quantity)?,
                sequence: 0,
            });
        }
        Ok(orders)
    }
}

/// Numeric bounds the engine reads on construction, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    pub max_block_txs: u32,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
}
