//! Server-Sent-Events stream of venue events for kiosks and staff consoles

pub mod handlers;

pub use handlers::*;
