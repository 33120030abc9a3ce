pub mod customers;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod pcs;
pub mod request_id;
pub mod sessions;
