//! PC DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::pc::Pc;

#[derive(Debug, Serialize, Deserialize)]
pub struct PcDto {
    pub id: i32,
    pub number: i32,
    pub status: String,
    pub specs: Option<String>,
    pub created_at: String,
}

impl From<Pc> for PcDto {
    fn from(pc: Pc) -> Self {
        Self {
            id: pc.id,
            number: pc.number,
            status: pc.status.to_string(),
            specs: pc.specs,
            created_at: pc.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPcRequest {
    #[validate(range(min = 1, message = "must be positive"))]
    pub number: i32,
    #[validate(length(max = 200))]
    pub specs: Option<String>,
}
