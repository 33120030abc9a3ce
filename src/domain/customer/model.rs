//! Customer domain entity

use chrono::{DateTime, Utc};

/// Walk-in customer identity
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    /// National identity number, unique per customer
    pub civil_id: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        civil_id: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            civil_id: civil_id.into(),
            phone: phone.into(),
            created_at: Utc::now(),
        }
    }
}
