//! Customer repository interface

use async_trait::async_trait;

use super::model::Customer;
use crate::domain::DomainResult;

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn save(&self, customer: Customer) -> DomainResult<Customer>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>>;
    async fn find_by_civil_id(&self, civil_id: &str) -> DomainResult<Option<Customer>>;
    /// Phone numbers are not unique; the latest registration wins.
    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Customer>>;
    /// Update mutable contact fields only.
    async fn update_phone(&self, id: i32, phone: &str) -> DomainResult<()>;
}
