//! Desk orders, the staff fulfilment queue and the menu

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
