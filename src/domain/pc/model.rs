//! PC domain entity

use chrono::{DateTime, Utc};

/// Workstation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcStatus {
    /// Free to be claimed by a new session
    Available,
    /// Bound to exactly one non-terminal session
    Occupied,
    /// Taken out of rotation by an operator
    Maintenance,
}

impl PcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "occupied" => Some(Self::Occupied),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

impl Default for PcStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl std::fmt::Display for PcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rentable workstation
#[derive(Debug, Clone, PartialEq)]
pub struct Pc {
    /// Internal identifier
    pub id: i32,
    /// Operator-assigned number shown on the desk
    pub number: i32,
    pub status: PcStatus,
    /// Free-text hardware description
    pub specs: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Pc {
    pub fn new(number: i32, specs: Option<String>) -> Self {
        Self {
            id: 0,
            number,
            status: PcStatus::Available,
            specs,
            created_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == PcStatus::Available
    }

    pub fn is_occupied(&self) -> bool {
        self.status == PcStatus::Occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pc_is_available() {
        let pc = Pc::new(7, Some("RTX 3080".into()));
        assert!(pc.is_available());
        assert!(!pc.is_occupied());
        assert_eq!(pc.number, 7);
    }

    #[test]
    fn status_string_mapping() {
        for status in [PcStatus::Available, PcStatus::Occupied, PcStatus::Maintenance] {
            assert_eq!(PcStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PcStatus::from_str("broken"), None);
        assert_eq!(PcStatus::Maintenance.to_string(), "maintenance");
    }
}
