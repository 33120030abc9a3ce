//! HTTP REST API for kiosks and staff consoles
//!
//! - `common`: response envelope, error mapping, validated JSON
//! - `modules`: handlers and DTOs per resource
//! - `router`: route table and middleware stack

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiContext};
