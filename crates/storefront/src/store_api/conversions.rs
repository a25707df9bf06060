//! Conversions between store API wire types and domain models.

use chrono::{DateTime, Utc};

use rwaya_core::{OrderId, OrderItemId, ProductId, TrackingUpdateId};

use super::StoreApiError;
use super::types::{
    CheckoutItem, CheckoutRequest, OrderItemResponse, OrderResponse, TrackingUpdateResponse,
};
use crate::models::{
    CheckoutIntent, Order, OrderItem, OrderProduct, ProductImage, TrackingUpdate,
};

/// Build the checkout request body for an intent.
pub fn checkout_request(intent: &CheckoutIntent) -> CheckoutRequest<'_> {
    CheckoutRequest {
        items: intent
            .lines
            .iter()
            .map(|line| CheckoutItem {
                id: line.id.as_str(),
                quantity: line.quantity.get(),
            })
            .collect(),
        customer_email: intent.customer_email.as_str(),
        phone: &intent.phone,
        address: &intent.address,
        county: &intent.county,
        customer_name: &intent.customer_name,
        id_number: &intent.id_number,
        shipping_method: intent.shipping_method,
    }
}

/// Parse an RFC 3339 timestamp from the wire.
fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, StoreApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreApiError::Parse(format!("{field}: {e} ({value:?})")))
}

/// Convert a tracked order. Tracking updates keep the order they were sent in.
pub fn convert_order(order: OrderResponse) -> Result<Order, StoreApiError> {
    let tracking_updates = order
        .tracking_updates
        .into_iter()
        .map(convert_tracking_update)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Order {
        id: OrderId::new(order.id),
        customer_name: order.customer_name,
        phone: order.phone,
        address: order.address,
        county: order.county,
        customer_email: order.customer_email,
        tracking_id: order.tracking_id,
        delivery_status: order.delivery_status,
        is_paid: order.is_paid,
        created_at: parse_timestamp("createdAt", &order.created_at)?,
        updated_at: parse_timestamp("updatedAt", &order.updated_at)?,
        order_items: order.order_items.into_iter().map(convert_order_item).collect(),
        tracking_updates,
    })
}

fn convert_order_item(item: OrderItemResponse) -> OrderItem {
    OrderItem {
        id: OrderItemId::new(item.id),
        quantity: item.quantity,
        product: OrderProduct {
            id: ProductId::new(item.product.id),
            name: item.product.name,
            price: item.product.price,
            images: item
                .product
                .images
                .into_iter()
                .map(|image| ProductImage { url: image.url })
                .collect(),
        },
    }
}

fn convert_tracking_update(update: TrackingUpdateResponse) -> Result<TrackingUpdate, StoreApiError> {
    Ok(TrackingUpdate {
        timestamp: parse_timestamp("timestamp", &update.timestamp)?,
        id: TrackingUpdateId::new(update.id),
        status: update.status,
        location: update.location,
        note: update.note,
    })
}
