//! Host-chain integration seam.
//!
//! The surrounding chain framework owns consensus, block production, and
//! persistence; it drives the engine exclusively through `StateMachine`.

use crate::engine::matchengine::{MatchEngine, TxReceipt};
use crate::errors::EngineError;

/// Trait for a state machine driven by the host chain.
/// The host applies committed transactions strictly in block order.
pub trait StateMachine {
    /// Apply one committed transaction. `height` is the enclosing block
    /// height; a height change marks a block boundary. Returns the encoded
    /// execution receipt for inclusion in block results.
    fn apply(&mut self, height: u64, data: &[u8]) -> Vec<u8>;

    /// Create a snapshot of the current state.
    fn snapshot(&self) -> Vec<u8>;

    /// Restore state from a snapshot taken at `last_height`.
    fn on_snapshot(&mut self, last_height: u64, data: &[u8]);
}

/// Adapts the match engine to the host chain.
#[derive(Debug, Clone)]
pub struct ChainState {
    engine: MatchEngine,
}

impl ChainState {
    pub fn new(engine: MatchEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MatchEngine {
        &mut self.engine
    }
}

impl StateMachine for ChainState {
    fn apply(&mut self, height: u64, data: &[u8]) -> Vec<u8> {
        if height != self.engine.block_height() {
            self.engine.begin_block(height);
        }
        let result: Result<TxReceipt, EngineError> = self.engine.execute(data);
        bincode::serialize(&result).unwrap()
    }

    fn snapshot(&self) -> Vec<u8> {
        self.engine.snapshot()
    }

    fn on_snapshot(&mut self, _last_height: u64, data: &[u8]) {
        if !data.is_empty() {
            self.engine.on_snapshot(data);
        }
    }
}
