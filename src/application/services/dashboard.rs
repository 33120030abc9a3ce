//! Staff dashboard aggregates

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::order::OrderStatus;
use crate::domain::pc::PcStatus;
use crate::domain::session::SessionStatus;
use crate::domain::{DomainResult, RepositoryProvider};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub pcs_total: u64,
    pub pcs_available: u64,
    pub pcs_occupied: u64,
    pub pcs_maintenance: u64,
    pub active_sessions: u64,
    pub paused_sessions: u64,
    /// Session payments taken today, in cents
    pub session_revenue_today: i64,
    /// Delivered orders placed today, in cents
    pub order_revenue_today: i64,
    /// Orders waiting in the fulfilment queue
    pub open_orders: u64,
}

pub struct DashboardService {
    repos: Arc<dyn RepositoryProvider>,
}

impl DashboardService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn snapshot(&self) -> DomainResult<DashboardSnapshot> {
        self.snapshot_at(Utc::now()).await
    }

    /// Figures for the UTC day containing `now`.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> DomainResult<DashboardSnapshot> {
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);

        let pcs = self.repos.pcs().find_all().await?;
        let count_pcs = |s: PcStatus| pcs.iter().filter(|p| p.status == s).count() as u64;

        let live = self.repos.sessions().find_live().await?;
        let count_live = |s: SessionStatus| live.iter().filter(|x| x.status == s).count() as u64;

        let session_revenue_today = self
            .repos
            .sessions()
            .find_started_since(day_start)
            .await?
            .iter()
            .map(|s| s.payment_amount)
            .sum();

        let order_revenue_today = self
            .repos
            .orders()
            .find_since(day_start)
            .await?
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.total_amount)
            .sum();

        let open_orders = self
            .repos
            .orders()
            .find_by_statuses(&OrderStatus::OPEN)
            .await?
            .len() as u64;

        Ok(DashboardSnapshot {
            generated_at: now,
            pcs_total: pcs.len() as u64,
            pcs_available: count_pcs(PcStatus::Available),
            pcs_occupied: count_pcs(PcStatus::Occupied),
            pcs_maintenance: count_pcs(PcStatus::Maintenance),
            active_sessions: count_live(SessionStatus::Active),
            paused_sessions: count_live(SessionStatus::Paused),
            session_revenue_today,
            order_revenue_today,
            open_orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::application::services::order_workflow::OrderWorkflow;
    use crate::application::services::resource_pool::ResourcePool;
    use crate::application::services::test_support::venue;
    use crate::domain::order::OrderItemRequest;
    use crate::domain::session::PaymentMethod;

    #[tokio::test]
    async fn snapshot_aggregates_today() {
        let v = venue().await;
        let manager = v.session_manager();
        let orders = OrderWorkflow::new(v.repos.clone(), v.events.clone());
        let pool = ResourcePool::new(v.repos.clone(), v.events.clone());
        let now = Utc::now();

        let a = manager
            .start(v.customers[0], v.pcs[0], 60, PaymentMethod::Cash)
            .await
            .unwrap();
        let b = manager
            .start(v.customers[1], v.pcs[1], 120, PaymentMethod::Knet)
            .await
            .unwrap();
        manager.pause(b.id).await.unwrap();
        pool.set_maintenance(v.pcs[2]).await.unwrap();

        let delivered = orders
            .create(a.id, vec![OrderItemRequest::new(v.cola.id, 2)])
            .await
            .unwrap();
        for step in [
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ] {
            orders.advance(delivered.id, step).await.unwrap();
        }
        orders
            .create(b.id, vec![OrderItemRequest::new(v.burger.id, 1)])
            .await
            .unwrap();

        let snap = DashboardService::new(v.repos.clone())
            .snapshot_at(now + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(snap.pcs_total, 3);
        assert_eq!(snap.pcs_available, 0);
        assert_eq!(snap.pcs_occupied, 2);
        assert_eq!(snap.pcs_maintenance, 1);
        assert_eq!(snap.active_sessions, 1);
        assert_eq!(snap.paused_sessions, 1);
        assert_eq!(snap.session_revenue_today, 500 + 900);
        assert_eq!(snap.order_revenue_today, 398);
        assert_eq!(snap.open_orders, 1);
    }

    #[tokio::test]
    async fn empty_venue() {
        let v = venue().await;
        let snap = DashboardService::new(v.repos.clone())
            .snapshot()
            .await
            .unwrap();
        assert_eq!(snap.pcs_total, 3);
        assert_eq!(snap.pcs_available, 3);
        assert_eq!(snap.active_sessions, 0);
        assert_eq!(snap.session_revenue_today, 0);
        assert_eq!(snap.open_orders, 0);
    }
}
