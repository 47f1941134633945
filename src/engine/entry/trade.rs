use serde::{Deserialize, Serialize};

/// A fill between a resting maker order and an incoming taker order.
/// The trade price is always the maker's resting price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub maker_order_id: String,
    pub taker_order_id: String,
    pub price: u64,
    pub quantity: u64,
    pub sequence: u64,
}

impl Trade {
    pub fn notional(&self) -> u128 {
        u128::from(self.price) * u128::from(self.quantity)
    }
}
