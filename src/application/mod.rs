pub mod services;

pub use services::{
    CustomerService, DashboardService, ExpiryMonitor, OrderWorkflow, ResourcePool, SessionManager,
};
