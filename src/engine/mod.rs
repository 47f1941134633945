//! Matching engine core.
//!
//! - `entry`: order and trade records
//! - `data`: book storage (order arena, FIFO queues, price levels, sides)
//! - `matchlogic`: price-time priority matching
//! - `matchengine`: transaction decoding, block accounting, snapshots

pub mod data;
pub mod entry;
pub mod matchengine;
pub mod matchlogic;
