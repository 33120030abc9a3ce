//! Menu catalog (read by order placement, maintained by venue staff)

pub mod model;
pub mod repository;

pub use model::{ItemExtra, ItemTakeout, MenuCategory, MenuItem};
pub use repository::CatalogRepository;
