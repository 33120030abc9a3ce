//! PC pool: listing, occupancy and administrative status changes.
//!
//! Occupancy only changes together with a session: `claim` opens the
//! session and occupies its PC in one transaction, `release` closes it and
//! frees the PC in one transaction. A PC is therefore occupied exactly while
//! a live session references it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::pc::{Pc, PcStatus};
use crate::domain::session::{Session, SessionStatus};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::notifications::{Event, PcStatusChangedEvent, SharedEventBus};
use crate::shared::errors::DomainError;

pub struct ResourcePool {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
}

impl ResourcePool {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus) -> Self {
        Self { repos, events }
    }

    /// Every PC regardless of status, ordered by number.
    pub async fn list_all(&self) -> DomainResult<Vec<Pc>> {
        self.repos.pcs().find_all().await
    }

    pub async fn list_available(&self) -> DomainResult<Vec<Pc>> {
        self.repos.pcs().find_by_status(PcStatus::Available).await
    }

    pub async fn find(&self, pc_id: i32) -> DomainResult<Pc> {
        self.repos
            .pcs()
            .find_by_id(pc_id)
            .await?
            .ok_or_else(|| DomainError::not_found("PC", pc_id))
    }

    /// Add a PC to the venue.
    pub async fn register(&self, number: i32, specs: Option<String>) -> DomainResult<Pc> {
        if number <= 0 {
            return Err(DomainError::Validation(format!(
                "PC number must be positive, got {}",
                number
            )));
        }
        let specs = specs.filter(|s| !s.trim().is_empty());
        let pc = self.repos.pcs().save(Pc::new(number, specs)).await?;
        info!(pc_id = pc.id, number, "PC registered");
        Ok(pc)
    }

    /// Occupy the session's PC and open the session atomically.
    /// `ResourceUnavailable` when the PC is not available, `NotFound` when
    /// it does not exist; nothing is written in either case.
    pub async fn claim(&self, session: Session) -> DomainResult<Session> {
        let pc_id = session.pc_id;
        let opened = match self.repos.sessions().open(session).await {
            Ok(opened) => opened,
            Err(e) => {
                if let DomainError::ResourceUnavailable(_) = e {
                    warn!(pc_id, "PC claim rejected: not available");
                }
                return Err(e);
            }
        };
        info!(pc_id, session_id = opened.id, "PC claimed");
        self.announce(pc_id).await;
        Ok(opened)
    }

    /// Close a live session as `outcome` and free its PC atomically.
    /// Returns `false` without touching anything when the session was
    /// already closed, so repeated releases are harmless.
    pub async fn release(
        &self,
        session: &Session,
        outcome: SessionStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        if !outcome.is_terminal() {
            return Err(DomainError::Validation(format!(
                "Cannot release a PC into session status {}",
                outcome
            )));
        }
        let released = self
            .repos
            .sessions()
            .close(session.id, outcome, &SessionStatus::LIVE, now)
            .await?;
        if released {
            info!(pc_id = session.pc_id, session_id = session.id, "PC released");
            self.announce(session.pc_id).await;
        }
        Ok(released)
    }

    /// Take a PC out of rotation. Rejected while a session holds it.
    pub async fn set_maintenance(&self, pc_id: i32) -> DomainResult<Pc> {
        let pc = self.find(pc_id).await?;
        if pc.status == PcStatus::Maintenance {
            return Ok(pc);
        }

        let moved = self
            .repos
            .pcs()
            .transition(pc_id, &[PcStatus::Available], PcStatus::Maintenance)
            .await?;
        if !moved {
            let current = self.find(pc_id).await?;
            if current.status != PcStatus::Maintenance {
                return Err(DomainError::invalid_transition(
                    "PC",
                    pc_id,
                    current.status,
                    "put into maintenance",
                ));
            }
            return Ok(current);
        }

        info!(pc_id, number = pc.number, "PC set to maintenance");
        self.announce(pc_id).await;
        self.find(pc_id).await
    }

    /// Return a PC from maintenance. No-op unless it is in maintenance.
    pub async fn clear_maintenance(&self, pc_id: i32) -> DomainResult<Pc> {
        let moved = self
            .repos
            .pcs()
            .transition(pc_id, &[PcStatus::Maintenance], PcStatus::Available)
            .await?;
        let pc = self.find(pc_id).await?;
        if moved {
            info!(pc_id, number = pc.number, "PC back in rotation");
            self.publish(&pc);
        }
        Ok(pc)
    }

    async fn announce(&self, pc_id: i32) {
        if let Ok(Some(pc)) = self.repos.pcs().find_by_id(pc_id).await {
            self.publish(&pc);
        }
    }

    fn publish(&self, pc: &Pc) {
        self.events
            .publish(Event::PcStatusChanged(PcStatusChangedEvent {
                pc_id: pc.id,
                number: pc.number,
                status: pc.status.to_string(),
                timestamp: Utc::now(),
            }));
    }
}
