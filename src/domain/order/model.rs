//! Order domain entities and fulfilment state machine
//!
//! ```text
//! pending -> preparing -> ready -> delivered
//! pending | preparing | ready -> cancelled
//! ```

use chrono::{DateTime, Utc};

use crate::shared::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// States still in the staff fulfilment queue.
    pub const OPEN: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The single forward step from this state, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested order line as submitted by the customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub menu_item_id: i32,
    pub quantity: i32,
    pub extra_ids: Vec<i32>,
    pub takeout_ids: Vec<i32>,
}

impl OrderItemRequest {
    pub fn new(menu_item_id: i32, quantity: i32) -> Self {
        Self {
            menu_item_id,
            quantity,
            extra_ids: Vec::new(),
            takeout_ids: Vec::new(),
        }
    }

    pub fn with_extras(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.extra_ids.extend(ids);
        self
    }

    pub fn with_takeouts(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.takeout_ids.extend(ids);
        self
    }
}

/// Extra selected on an order line, with its price snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedExtra {
    pub extra_id: i32,
    pub name: String,
    pub price: i64,
}

/// Takeout selected on an order line
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTakeout {
    pub takeout_id: i32,
    pub name: String,
}

/// One catalog item within an order, priced at order time
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    /// Item name at order time
    pub name: String,
    pub quantity: i32,
    /// Unit price snapshot in cents
    pub unit_price: i64,
    pub extras: Vec<SelectedExtra>,
    pub takeouts: Vec<SelectedTakeout>,
}

impl OrderItem {
    /// `(unit_price + sum(extras)) * quantity`, or `None` if it does not
    /// fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.extras
            .iter()
            .try_fold(self.unit_price, |acc, e| acc.checked_add(e.price))?
            .checked_mul(i64::from(self.quantity))
    }
}

/// Purchase scoped to a session
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i32,
    pub session_id: i32,
    pub status: OrderStatus,
    pub order_time: DateTime<Utc>,
    /// Set only when the order is delivered
    pub delivery_time: Option<DateTime<Utc>>,
    /// Sum of line totals in cents
    pub total_amount: i64,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn new(
        session_id: i32,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let total_amount = Self::total_of(&items)?;
        Ok(Self {
            id: 0,
            session_id,
            status: OrderStatus::Pending,
            order_time: now,
            delivery_time: None,
            total_amount,
            items,
        })
    }

    pub fn total_of(items: &[OrderItem]) -> Result<i64, DomainError> {
        items
            .iter()
            .try_fold(0i64, |acc, line| {
                line.line_total().and_then(|t| acc.checked_add(t))
            })
            .ok_or_else(|| DomainError::Validation("Order total is out of range".into()))
    }

    /// Move to `target`. Only the next forward step is legal; `cancelled`
    /// is delegated to [`Order::cancel`]. Returns whether anything changed.
    pub fn advance(&mut self, target: OrderStatus, now: DateTime<Utc>) -> Result<bool, DomainError> {
        if target == OrderStatus::Cancelled {
            return self.cancel();
        }
        if self.status.next() != Some(target) {
            return Err(DomainError::invalid_transition(
                "Order",
                self.id,
                self.status,
                "advance",
            ));
        }
        self.status = target;
        if target == OrderStatus::Delivered {
            self.delivery_time = Some(now);
        }
        Ok(true)
    }

    /// Cancel from any open state. Cancelling a cancelled order is a no-op.
    pub fn cancel(&mut self) -> Result<bool, DomainError> {
        match self.status {
            OrderStatus::Cancelled => Ok(false),
            OrderStatus::Delivered => Err(DomainError::invalid_transition(
                "Order",
                self.id,
                self.status,
                "cancel",
            )),
            _ => {
                self.status = OrderStatus::Cancelled;
                Ok(true)
            }
        }
    }

    /// Lines may only be edited before the kitchen picks the order up.
    pub fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invalid_transition(
                "Order",
                self.id,
                self.status,
                "edit items of",
            ));
        }
        Ok(())
    }
}
