//! Application services

mod customers;
mod dashboard;
mod expiry_monitor;
mod order_workflow;
mod resource_pool;
mod session_manager;

#[cfg(test)]
pub(crate) mod test_support;

pub use customers::CustomerService;
pub use dashboard::{DashboardService, DashboardSnapshot};
pub use expiry_monitor::{
    remaining_seconds, CountdownWatch, ExpiryMonitor, MonitorConfig, PollOutcome, SweepReport,
};
pub use order_workflow::{MenuEntry, OrderWorkflow};
pub use resource_pool::ResourcePool;
pub use session_manager::{Completion, SessionManager};
