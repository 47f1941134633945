use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrderSide {
    #[default]
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

/// A resting or incoming order.
///
/// Prices are tick counts and quantities lot counts; price 0 marks a market
/// order. `quantity` is the remaining (unfilled) amount and is decremented
/// by the engine as the order fills. `sequence` is the logical arrival
/// stamp assigned on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Order {
    pub id: String,
    pub owner: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: u64,
    pub quantity: u64,
    pub sequence: u64,
}

impl Order {
    pub fn limit(
        id: impl Into<String>,
        owner: impl Into<String>,
        side: OrderSide,
        price: u64,
        quantity: u64,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            side,
            order_type: OrderType::Limit,
            price,
            quantity,
            sequence: 0,
        }
    }

    pub fn market(
        id: impl Into<String>,
        owner: impl Into<String>,
        side: OrderSide,
        quantity: u64,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            side,
            order_type: OrderType::Market,
            price: 0,
            quantity,
            sequence: 0,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_side() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn market_constructor_zeroes_price() {
        let order = Order::market("m1", "alice", OrderSide::Buy, 10);
        assert_eq!(order.price, 0);
        assert_eq!(order.order_type, OrderType::Market);
        assert!(!order.is_filled());
    }
}
