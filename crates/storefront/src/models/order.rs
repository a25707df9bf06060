//! Order and tracking timeline models.
//!
//! Orders are owned by the store backend; the storefront only reads them
//! through the tracking API and never persists them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use rwaya_core::{DeliveryCategory, OrderId, OrderItemId, ProductId, TrackingUpdateId};

/// An order as returned by the tracking API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub county: String,
    pub customer_email: Option<String>,
    pub tracking_id: Option<String>,
    pub delivery_status: String,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_items: Vec<OrderItem>,
    /// Ascending by timestamp, in the order the server sent them.
    pub tracking_updates: Vec<TrackingUpdate>,
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub quantity: u32,
    pub product: OrderProduct,
}

/// Product snapshot attached to an order line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductImage {
    pub url: String,
}

/// One entry of the delivery timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingUpdate {
    pub id: TrackingUpdateId,
    pub status: String,
    pub location: Option<String>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An order normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedOrder {
    pub order: Order,
    pub category: DeliveryCategory,
    pub total: Decimal,
}

impl TrackedOrder {
    /// Derive the display values for an order.
    ///
    /// The category comes from the last tracking update as received, or from
    /// the order's own delivery status when there are no updates.
    #[must_use]
    pub fn new(order: Order) -> Self {
        let category = DeliveryCategory::from_status(latest_status(&order));
        let total = order
            .order_items
            .iter()
            .map(|item| item.product.price * Decimal::from(item.quantity))
            .sum();

        Self {
            order,
            category,
            total,
        }
    }

    /// Status string the category was derived from.
    #[must_use]
    pub fn latest_status(&self) -> &str {
        latest_status(&self.order)
    }

    /// Last six characters of the order id.
    #[must_use]
    pub fn short_number(&self) -> &str {
        let id = self.order.id.as_str();
        let start = id.char_indices().rev().nth(5).map_or(0, |(i, _)| i);
        id.get(start..).unwrap_or(id)
    }

    #[must_use]
    pub const fn payment_label(&self) -> &'static str {
        if self.order.is_paid { "Paid" } else { "Pending" }
    }

    #[must_use]
    pub fn has_updates(&self) -> bool {
        !self.order.tracking_updates.is_empty()
    }
}

fn latest_status(order: &Order) -> &str {
    order
        .tracking_updates
        .last()
        .map_or(order.delivery_status.as_str(), |update| update.status.as_str())
}
