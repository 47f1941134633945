pub mod orderbook;
pub mod queue;
pub mod side;

pub use orderbook::OrderBook;
pub use queue::{OrderNode, OrderQueue};
pub use side::{BookSide, PriceLevel};
