//! Session DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{remaining_seconds, Completion, PollOutcome};
use crate::domain::pricing::format_amount;
use crate::domain::session::Session;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDto {
    pub id: i32,
    pub user_id: i32,
    pub pc_id: i32,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    pub status: String,
    pub payment_method: String,
    /// Cents
    pub payment_amount: i64,
    /// e.g. "5.00 USD"
    pub payment_display: String,
    pub ended_at: Option<String>,
    pub remaining_seconds: i64,
}

impl SessionDto {
    pub fn at(s: Session, currency: &str, now: DateTime<Utc>) -> Self {
        let remaining = if s.is_terminal() {
            0
        } else {
            remaining_seconds(&s, now)
        };
        Self {
            id: s.id,
            user_id: s.user_id,
            pc_id: s.pc_id,
            start_time: s.start_time.to_rfc3339(),
            end_time: s.end_time.to_rfc3339(),
            duration_minutes: s.duration_minutes,
            status: s.status.to_string(),
            payment_method: s.payment_method.to_string(),
            payment_amount: s.payment_amount,
            payment_display: format_amount(s.payment_amount, currency),
            ended_at: s.ended_at.map(|t| t.to_rfc3339()),
            remaining_seconds: remaining,
        }
    }

    pub fn now(s: Session, currency: &str) -> Self {
        Self::at(s, currency, Utc::now())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionDto {
    pub session: SessionDto,
    /// `false` when the session was already closed
    pub applied: bool,
}

impl CompletionDto {
    pub fn new(c: Completion, currency: &str) -> Self {
        Self {
            session: SessionDto::now(c.session, currency),
            applied: c.applied,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollDto {
    pub session: SessionDto,
    pub remaining_seconds: i64,
    /// Warning thresholds crossed since the previous poll
    pub warnings: Vec<i64>,
    pub expired_now: bool,
}

impl PollDto {
    pub fn new(p: PollOutcome, currency: &str) -> Self {
        Self {
            session: SessionDto::now(p.session, currency),
            remaining_seconds: p.remaining_seconds,
            warnings: p.warnings,
            expired_now: p.expired_now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    pub user_id: i32,
    pub pc_id: i32,
    #[validate(range(min = 1, max = 1440, message = "must be between 1 and 1440"))]
    pub duration_minutes: i32,
    /// `cash`, `apple_pay` or `knet`
    pub payment_method: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtendSessionRequest {
    #[validate(range(min = 1, max = 1440, message = "must be between 1 and 1440"))]
    pub extra_minutes: i32,
    pub payment_method: String,
}
