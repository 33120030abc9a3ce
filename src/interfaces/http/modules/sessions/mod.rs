//! Session lifecycle endpoints and the kiosk countdown poll

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
