//! Customer DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::customer::Customer;

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerDto {
    pub id: i32,
    pub name: String,
    pub civil_id: String,
    pub phone: String,
    pub created_at: String,
}

impl From<Customer> for CustomerDto {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            civil_id: c.civil_id,
            phone: c.phone,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub civil_id: String,
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
}

/// `?q=` holds a civil id or a phone number
#[derive(Debug, Deserialize)]
pub struct CustomerLookupQuery {
    pub q: String,
}
