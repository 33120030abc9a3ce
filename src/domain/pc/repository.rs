//! PC repository interface

use async_trait::async_trait;

use super::model::{Pc, PcStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait PcRepository: Send + Sync {
    /// Insert a new PC and return it with its assigned id.
    async fn save(&self, pc: Pc) -> DomainResult<Pc>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Pc>>;
    async fn find_by_number(&self, number: i32) -> DomainResult<Option<Pc>>;
    /// All PCs ordered by number.
    async fn find_all(&self) -> DomainResult<Vec<Pc>>;
    async fn find_by_status(&self, status: PcStatus) -> DomainResult<Vec<Pc>>;
    /// Conditionally move a PC from one of `from` to `to`.
    /// Returns `false` when the PC was not in any of the expected states.
    /// Occupancy is never changed through here: sessions own it.
    async fn transition(&self, id: i32, from: &[PcStatus], to: PcStatus) -> DomainResult<bool>;
    async fn count(&self) -> DomainResult<u64>;
}
