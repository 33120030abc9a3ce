//! Staff dashboard aggregates

pub mod handlers;

pub use handlers::*;
