//! PC pool: listing and operator administration

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
