//! Catalog entities: menu items with their priced extras and free takeouts

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCategory {
    Food,
    Drink,
    Accessory,
    Service,
}

impl MenuCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Drink => "drink",
            Self::Accessory => "accessory",
            Self::Service => "service",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "food" => Some(Self::Food),
            "drink" => Some(Self::Drink),
            "accessory" => Some(Self::Accessory),
            "service" => Some(Self::Service),
            _ => None,
        }
    }
}

impl std::fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a customer can order to their desk
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub category: MenuCategory,
    /// Unit price in cents
    pub price: i64,
    pub description: Option<String>,
    /// Disabled items cannot be ordered
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, category: MenuCategory, price: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category,
            price,
            description: None,
            available: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Priced add-on for a menu item ("extra cheese")
#[derive(Debug, Clone, PartialEq)]
pub struct ItemExtra {
    pub id: i32,
    pub menu_item_id: i32,
    pub name: String,
    /// Price per unit of the parent item, in cents
    pub price: i64,
}

impl ItemExtra {
    pub fn new(menu_item_id: i32, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: 0,
            menu_item_id,
            name: name.into(),
            price,
        }
    }
}

/// Free removal option for a menu item ("no onions")
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTakeout {
    pub id: i32,
    pub menu_item_id: i32,
    pub name: String,
}

impl ItemTakeout {
    pub fn new(menu_item_id: i32, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            menu_item_id,
            name: name.into(),
        }
    }
}
