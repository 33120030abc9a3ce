//! Order and menu DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::MenuEntry;
use crate::domain::catalog::MenuItem;
use crate::domain::order::{Order, OrderItem, OrderItemRequest};

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectedExtraDto {
    pub extra_id: i32,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectedTakeoutDto {
    pub takeout_id: i32,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub id: i32,
    pub menu_item_id: i32,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    /// Absent when the line does not fit in an `i64`
    pub line_total: Option<i64>,
    pub extras: Vec<SelectedExtraDto>,
    pub takeouts: Vec<SelectedTakeoutDto>,
}

impl From<OrderItem> for OrderItemDto {
    fn from(i: OrderItem) -> Self {
        let line_total = i.line_total();
        Self {
            id: i.id,
            menu_item_id: i.menu_item_id,
            name: i.name,
            quantity: i.quantity,
            unit_price: i.unit_price,
            line_total,
            extras: i
                .extras
                .into_iter()
                .map(|e| SelectedExtraDto {
                    extra_id: e.extra_id,
                    name: e.name,
                    price: e.price,
                })
                .collect(),
            takeouts: i
                .takeouts
                .into_iter()
                .map(|t| SelectedTakeoutDto {
                    takeout_id: t.takeout_id,
                    name: t.name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: i32,
    pub session_id: i32,
    pub status: String,
    pub order_time: String,
    pub delivery_time: Option<String>,
    pub total_amount: i64,
    pub items: Vec<OrderItemDto>,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            session_id: o.session_id,
            status: o.status.to_string(),
            order_time: o.order_time.to_rfc3339(),
            delivery_time: o.delivery_time.map(|t| t.to_rfc3339()),
            total_amount: o.total_amount,
            items: o.items.into_iter().map(OrderItemDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderLinePayload {
    pub menu_item_id: i32,
    #[validate(range(min = 1, message = "must be positive"))]
    pub quantity: i32,
    #[serde(default)]
    pub extra_ids: Vec<i32>,
    #[serde(default)]
    pub takeout_ids: Vec<i32>,
}

impl From<OrderLinePayload> for OrderItemRequest {
    fn from(p: OrderLinePayload) -> Self {
        OrderItemRequest::new(p.menu_item_id, p.quantity)
            .with_extras(p.extra_ids)
            .with_takeouts(p.takeout_ids)
    }
}

/// Body of order creation and line replacement
#[derive(Debug, Deserialize, Validate)]
pub struct OrderLinesRequest {
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<OrderLinePayload>,
}

impl OrderLinesRequest {
    pub fn into_requests(self) -> Vec<OrderItemRequest> {
        self.items.into_iter().map(OrderItemRequest::from).collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvanceOrderRequest {
    /// Target status: `preparing`, `ready`, `delivered` or `cancelled`
    #[validate(length(min = 1))]
    pub status: String,
}

/// Present when the customer cancels from the kiosk
#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderParams {
    pub session_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MenuOptionDto {
    pub id: i32,
    pub name: String,
    /// Cents; takeouts are free
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MenuEntryDto {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub description: Option<String>,
    pub extras: Vec<MenuOptionDto>,
    pub takeouts: Vec<MenuOptionDto>,
}

impl From<MenuEntry> for MenuEntryDto {
    fn from(e: MenuEntry) -> Self {
        Self {
            id: e.item.id,
            name: e.item.name,
            category: e.item.category.to_string(),
            price: e.item.price,
            description: e.item.description,
            extras: e
                .extras
                .into_iter()
                .map(|x| MenuOptionDto {
                    id: x.id,
                    name: x.name,
                    price: x.price,
                })
                .collect(),
            takeouts: e
                .takeouts
                .into_iter()
                .map(|t| MenuOptionDto {
                    id: t.id,
                    name: t.name,
                    price: 0,
                })
                .collect(),
        }
    }
}

/// Staff edit of a menu item; omitted fields stay as they are
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMenuItemRequest {
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: Option<i64>,
    pub available: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MenuItemDto {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub available: bool,
}

impl From<MenuItem> for MenuItemDto {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            category: item.category.to_string(),
            price: item.price,
            available: item.available,
        }
    }
}
