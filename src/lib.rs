//! # Gaming Lounge Service
//!
//! Rental engine for a gaming venue: PCs are rented for prepaid durations,
//! sessions count down to automatic expiry, and customers order food and
//! accessories to their desk.
//!
//! ## Architecture
//!
//! - **domain**: Entities, state machines, pricing and repository ports
//! - **application**: Services (PC pool, sessions, expiry monitor, orders)
//! - **infrastructure**: SeaORM entities, migrations and repositories
//! - **interfaces**: REST API and event stream for kiosks and staff consoles
//! - **notifications**: In-process event bus
//! - **shared**: Errors, retry and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::create_api_router;

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
