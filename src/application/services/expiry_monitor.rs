//! Expiry Monitor Service
//!
//! Remaining time is always recomputed from the stored `end_time`; no
//! countdown state is persisted. Any holder of a session id may `poll` it,
//! and a background sweep does the same for every live session so expiry
//! does not depend on a kiosk being open.
//!
//! Warnings are edge-triggered: each threshold fires once when remaining
//! time drops across it, not on every poll below it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::session::Session;
use crate::domain::DomainResult;
use crate::notifications::{
    Event, SessionExpiredEvent, SessionExpiryWarningEvent, SharedEventBus,
};
use crate::shared::shutdown::ShutdownSignal;

use super::session_manager::SessionManager;

/// Seconds left before `end_time`, never negative.
pub fn remaining_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    (session.end_time - now).num_seconds().max(0)
}

/// Edge detector for one session's countdown
#[derive(Debug, Clone)]
pub struct CountdownWatch {
    /// Descending
    thresholds: Vec<i64>,
    last: Option<i64>,
}

impl CountdownWatch {
    pub fn new(thresholds: &[i64]) -> Self {
        let mut thresholds = thresholds.to_vec();
        thresholds.sort_unstable_by(|a, b| b.cmp(a));
        thresholds.dedup();
        Self {
            thresholds,
            last: None,
        }
    }

    /// Feed the latest remaining time; returns the thresholds crossed since
    /// the previous observation. The first observation only sets the
    /// baseline. Time going up (an extension) re-arms the thresholds above
    /// the new value.
    pub fn observe(&mut self, remaining: i64) -> Vec<i64> {
        let crossed = match self.last {
            Some(prev) => self
                .thresholds
                .iter()
                .copied()
                .filter(|t| prev > *t && *t >= remaining)
                .collect(),
            None => Vec::new(),
        };
        self.last = Some(remaining);
        crossed
    }
}

/// Configuration for the background sweep
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub tick_interval_secs: u64,
    pub warning_thresholds_secs: Vec<i64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1,
            warning_thresholds_secs: vec![300, 60],
        }
    }
}

/// Result of polling one session
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub session: Session,
    pub remaining_seconds: i64,
    /// Thresholds crossed since the previous observation of this session
    pub warnings: Vec<i64>,
    /// This poll completed the session
    pub expired_now: bool,
}

/// Result of one sweep over all live sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub completed: Vec<i32>,
    pub warnings: usize,
}

pub struct ExpiryMonitor {
    sessions: Arc<SessionManager>,
    events: SharedEventBus,
    config: MonitorConfig,
    watches: DashMap<i32, CountdownWatch>,
    running: Arc<RwLock<bool>>,
}

impl ExpiryMonitor {
    pub fn new(sessions: Arc<SessionManager>, events: SharedEventBus) -> Self {
        Self {
            sessions,
            events,
            config: MonitorConfig::default(),
            watches: DashMap::new(),
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn poll(&self, session_id: i32) -> DomainResult<PollOutcome> {
        self.poll_at(session_id, Utc::now()).await
    }

    /// Recompute remaining time; completes the session when it hits zero.
    pub async fn poll_at(&self, session_id: i32, now: DateTime<Utc>) -> DomainResult<PollOutcome> {
        let session = self.sessions.get(session_id).await?;
        let remaining = remaining_seconds(&session, now);

        if session.is_terminal() {
            self.watches.remove(&session_id);
            return Ok(PollOutcome {
                session,
                remaining_seconds: remaining,
                warnings: Vec::new(),
                expired_now: false,
            });
        }

        let warnings = self.observe(&session, remaining, now);

        if remaining == 0 {
            let (session, expired_now) = self.expire(session_id, now).await?;
            return Ok(PollOutcome {
                session,
                remaining_seconds: 0,
                warnings,
                expired_now,
            });
        }

        Ok(PollOutcome {
            session,
            remaining_seconds: remaining,
            warnings,
            expired_now: false,
        })
    }

    /// Complete every overdue session and feed the rest through their
    /// countdown watches.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> DomainResult<SweepReport> {
        let mut report = SweepReport::default();

        let live = self.sessions.live_sessions().await?;
        let mut still_live = HashSet::with_capacity(live.len());

        for session in live {
            let remaining = remaining_seconds(&session, now);
            report.warnings += self.observe(&session, remaining, now).len();

            if remaining > 0 {
                still_live.insert(session.id);
                continue;
            }
            match self.expire(session.id, now).await {
                Ok((_, true)) => report.completed.push(session.id),
                Ok((_, false)) => {}
                Err(e) => warn!(session_id = session.id, error = %e, "Failed to expire session"),
            }
        }

        self.watches.retain(|id, _| still_live.contains(id));

        if !report.completed.is_empty() {
            info!(count = report.completed.len(), "Expired sessions completed");
        }
        Ok(report)
    }

    /// Start the background sweep
    pub fn start(self: &Arc<Self>, shutdown: ShutdownSignal) {
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            *monitor.running.write().await = true;
            let tick = monitor.config.tick_interval_secs.max(1);
            info!(tick_interval = tick, "⏱️ Expiry monitor started");

            let mut interval = tokio::time::interval(Duration::from_secs(tick));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = monitor.sweep_at(Utc::now()).await {
                            warn!(error = %e, "Expiry sweep error");
                        }
                    }
                    _ = shutdown.wait() => {
                        info!("⏱️ Expiry monitor shutting down");
                        break;
                    }
                }
            }

            *monitor.running.write().await = false;
            info!("⏱️ Expiry monitor stopped");
        });
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    fn observe(&self, session: &Session, remaining: i64, now: DateTime<Utc>) -> Vec<i64> {
        let crossed = self
            .watches
            .entry(session.id)
            .or_insert_with(|| CountdownWatch::new(&self.config.warning_thresholds_secs))
            .observe(remaining);

        for threshold in &crossed {
            info!(
                session_id = session.id,
                pc_id = session.pc_id,
                threshold,
                remaining,
                "Session expiry warning"
            );
            self.events
                .publish(Event::SessionExpiryWarning(SessionExpiryWarningEvent {
                    session_id: session.id,
                    pc_id: session.pc_id,
                    threshold_secs: *threshold,
                    remaining_secs: remaining,
                    timestamp: now,
                }));
        }
        crossed
    }

    async fn expire(&self, session_id: i32, now: DateTime<Utc>) -> DomainResult<(Session, bool)> {
        let completion = self.sessions.complete_at(session_id, now).await?;
        self.watches.remove(&session_id);

        if completion.applied {
            self.events.publish(Event::SessionExpired(SessionExpiredEvent {
                session_id,
                pc_id: completion.session.pc_id,
                timestamp: now,
            }));
        } else {
            debug!("Session {} already closed", session_id);
        }
        Ok((completion.session, completion.applied))
    }
}
