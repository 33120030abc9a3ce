//! PC aggregate
//!
//! A rentable workstation and its repository interface.

pub mod model;
pub mod repository;

pub use model::{Pc, PcStatus};
pub use repository::PcRepository;
