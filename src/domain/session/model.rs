//! Session domain entity and its state machine
//!
//! ```text
//! active <-> paused
//! active | paused -> completed   (countdown reached zero, idempotent)
//! active | paused -> terminated  (operator cancellation)
//! ```
//!
//! `end_time` is always `start_time + duration_minutes`. Pausing does not
//! move `end_time`: a paused session keeps counting down.

use chrono::{DateTime, Duration, Utc};

use crate::shared::errors::DomainError;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Terminated,
}

impl SessionStatus {
    /// States that still hold the PC.
    pub const LIVE: [SessionStatus; 2] = [SessionStatus::Active, SessionStatus::Paused];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    ApplePay,
    Knet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::ApplePay => "apple_pay",
            Self::Knet => "knet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(' ', "_").as_str() {
            "cash" => Some(Self::Cash),
            "apple_pay" => Some(Self::ApplePay),
            "knet" => Some(Self::Knet),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rental session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub pc_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Cumulative paid duration
    pub duration_minutes: i32,
    pub status: SessionStatus,
    pub payment_method: PaymentMethod,
    /// Cumulative amount paid, in cents
    pub payment_amount: i64,
    /// When the session reached a terminal state
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        user_id: i32,
        pc_id: i32,
        duration_minutes: i32,
        payment_method: PaymentMethod,
        payment_amount: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            pc_id,
            start_time: now,
            end_time: now + Duration::minutes(duration_minutes as i64),
            duration_minutes,
            status: SessionStatus::Active,
            payment_method,
            payment_amount,
            ended_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        if self.status != SessionStatus::Active {
            return Err(self.rejected("pause"));
        }
        self.status = SessionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), DomainError> {
        if self.status != SessionStatus::Paused {
            return Err(self.rejected("resume"));
        }
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Add paid time. Both `end_time` and `payment_amount` grow by exactly
    /// the given deltas.
    pub fn extend(&mut self, extra_minutes: i32, amount: i64) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(self.rejected("extend"));
        }
        if extra_minutes <= 0 {
            return Err(DomainError::Validation(
                "Extension must be a positive number of minutes".to_string(),
            ));
        }
        let out_of_range = || {
            DomainError::Validation(format!(
                "Extending session {} by {} minutes is out of range",
                self.id, extra_minutes
            ))
        };
        let duration_minutes = self
            .duration_minutes
            .checked_add(extra_minutes)
            .ok_or_else(out_of_range)?;
        let end_time = Duration::try_minutes(i64::from(duration_minutes))
            .and_then(|d| self.start_time.checked_add_signed(d))
            .ok_or_else(out_of_range)?;
        let payment_amount = self
            .payment_amount
            .checked_add(amount)
            .ok_or_else(out_of_range)?;

        self.duration_minutes = duration_minutes;
        self.end_time = end_time;
        self.payment_amount = payment_amount;
        Ok(())
    }

    pub fn terminate(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(self.rejected("terminate"));
        }
        self.status = SessionStatus::Terminated;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Mark as completed. Returns `false` (no change) when already terminal.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = SessionStatus::Completed;
        self.ended_at = Some(now);
        true
    }

    fn rejected(&self, action: &'static str) -> DomainError {
        DomainError::invalid_transition("Session", self.id, self.status, action)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        let start = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Session::new(1, 3, 60, PaymentMethod::Cash, 500, start)
    }

    #[test]
    fn new_session_is_active_with_derived_end_time() {
        let s = sample();
        assert_eq!(s.status, SessionStatus::Active);
        assert_eq!(s.end_time - s.start_time, Duration::minutes(60));
        assert!(s.is_live());
        assert!(s.ended_at.is_none());
    }

    #[test]
    fn pause_and_resume_toggle() {
        let mut s = sample();
        s.pause().unwrap();
        assert_eq!(s.status, SessionStatus::Paused);
        assert!(s.pause().is_err());
        s.resume().unwrap();
        assert_eq!(s.status, SessionStatus::Active);
        assert!(s.resume().is_err());
    }

    #[test]
    fn pause_keeps_end_time() {
        let mut s = sample();
        let end = s.end_time;
        s.pause().unwrap();
        assert_eq!(s.end_time, end);
    }

    #[test]
    fn extend_is_additive() {
        let mut s = sample();
        let end = s.end_time;
        s.extend(60, 500).unwrap();
        assert_eq!(s.duration_minutes, 120);
        assert_eq!(s.payment_amount, 1000);
        assert_eq!(s.end_time, end + Duration::minutes(60));
        assert_eq!(s.end_time, s.start_time + Duration::minutes(120));
    }

    #[test]
    fn extend_while_paused_is_allowed() {
        let mut s = sample();
        s.pause().unwrap();
        assert!(s.extend(30, 250).is_ok());
    }

    #[test]
    fn extend_rejects_terminal_and_non_positive() {
        let mut s = sample();
        assert!(matches!(s.extend(0, 0), Err(DomainError::Validation(_))));
        s.terminate(Utc::now()).unwrap();
        assert!(matches!(
            s.extend(60, 500),
            Err(DomainError::InvalidTransition { action: "extend", .. })
        ));
        assert_eq!(s.duration_minutes, 60);
    }

    #[test]
    fn extend_overflow_leaves_session_untouched() {
        let mut s = sample();
        let before = s.clone();
        assert!(matches!(
            s.extend(i32::MAX - 10, 500),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            s.extend(30, i64::MAX),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn complete_is_idempotent() {
        let mut s = sample();
        assert!(s.complete(Utc::now()));
        let ended = s.ended_at;
        assert!(!s.complete(Utc::now()));
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.ended_at, ended);
    }

    #[test]
    fn complete_does_not_override_termination() {
        let mut s = sample();
        s.terminate(Utc::now()).unwrap();
        assert!(!s.complete(Utc::now()));
        assert_eq!(s.status, SessionStatus::Terminated);
    }

    #[test]
    fn terminate_from_terminal_is_rejected() {
        let mut s = sample();
        s.complete(Utc::now());
        assert!(s.terminate(Utc::now()).is_err());
    }

    #[test]
    fn payment_method_parsing() {
        assert_eq!(PaymentMethod::from_str("Apple Pay"), Some(PaymentMethod::ApplePay));
        assert_eq!(PaymentMethod::from_str("KNET"), Some(PaymentMethod::Knet));
        assert_eq!(PaymentMethod::from_str("cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_str("card"), None);
    }
}
