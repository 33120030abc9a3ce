pub mod catalog;
pub mod customer;
pub mod order;
pub mod pc;
pub mod pricing;
pub mod repositories;
pub mod session;

// Re-export commonly used types
pub use catalog::{ItemExtra, ItemTakeout, MenuCategory, MenuItem};
pub use customer::Customer;
pub use order::{Order, OrderItem, OrderItemRequest, OrderStatus};
pub use pc::{Pc, PcStatus};
pub use pricing::{BillingCalculator, DurationTier, PricingTable};
pub use repositories::{DomainResult, RepositoryProvider};
pub use session::{PaymentMethod, Session, SessionStatus};

pub use crate::shared::errors::DomainError;
