//! Session aggregate
//!
//! The rental contract binding one customer to one PC for a paid duration.

pub mod model;
pub mod repository;

pub use model::{PaymentMethod, Session, SessionStatus};
pub use repository::SessionRepository;
