//! Deterministic central limit order book matching engine embedded in a
//! blockchain virtual machine.
//!
//! Orders arrive as transactions, are matched against a persistent book
//! under strict price-time priority, and produce trade records that become
//! part of block state. Replaying the same transaction stream yields
//! bit-identical state on every replica: no wall-clock reads, no randomness,
//! no unordered iteration anywhere in the engine.
//!
//! - `engine`: order records, book data structures, matching logic, and the
//!   transaction-level state machine
//! - `chain`: the state machine seam the host chain drives
//! - `genesis`: chain parameters and initial book configuration
//! - `metrics`: Prometheus counters for executed actions

pub mod chain;
pub mod engine;
pub mod errors;
pub mod genesis;
pub mod metrics;

pub use chain::{ChainState, StateMachine};
pub use engine::entry::{Order, OrderSide, OrderType, Trade};
pub use engine::matchengine::{EngineCmd, EngineCmdType, MatchEngine, TxReceipt};
pub use engine::matchlogic::{BookSnapshot, Matcher, SubmitStatus};
pub use errors::EngineError;
pub use genesis::{Genesis, GenesisError, InitialOrder, Rules};
