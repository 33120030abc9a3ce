//! Order aggregate
//!
//! Food/drink/accessory purchases scoped to a rental session.

pub mod model;
pub mod repository;

pub use model::{
    Order, OrderItem, OrderItemRequest, OrderStatus, SelectedExtra, SelectedTakeout,
};
pub use repository::OrderRepository;
