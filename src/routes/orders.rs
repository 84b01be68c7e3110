//! # Order lifecycle
//!
//! Creation, owner-scoped reads, and permission-gated cancellation.
//!
//! Cancellation is role-based only: any caller holding `cancel_order`
//! (manager or admin) may cancel any order by id, owner or not. That broad
//! authority matches product behavior and is kept on purpose.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{DeliveryAddress, Identity, Order, OrderItem, OrderStatus, OrderSummary, PaymentDetails},
    routes::ValidJson,
    state::AppState,
};

/// Listing page size.
const PAGE_SIZE: usize = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    items: Option<Vec<OrderItem>>,
    payment_details: Option<PaymentDetails>,
    delivery_address: Option<DeliveryAddress>,
    order_summary: Option<OrderSummary>,
    customer_name: Option<String>,
    customer_email: Option<String>,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidJson(body): ValidJson<CreateOrderRequest>,
) -> Result<Json<Value>, AppError> {
    let items = body.items.unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::Validation("No items in order".into()));
    }

    let (Some(mut payment_details), Some(delivery_address)) =
        (body.payment_details, body.delivery_address)
    else {
        return Err(AppError::Validation(
            "Missing payment or delivery information".into(),
        ));
    };

    let order_summary = body
        .order_summary
        .ok_or_else(|| AppError::Validation("Missing order summary".into()))?;

    // Only the last 4 digits of the card number are persisted.
    payment_details.card_number = last4(&payment_details.card_number);

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: identity.user_id.clone(),
        customer_name: body.customer_name.unwrap_or_default(),
        customer_email: body.customer_email.unwrap_or_else(|| identity.email.clone()),
        items,
        payment_details,
        delivery_address,
        order_summary,
        status: OrderStatus::Confirmed,
        order_date: Utc::now(),
    };
    state.store.insert_order(&order).await?;

    info!(order_id = %order.id, user_id = %identity.user_id, "order placed");

    Ok(Json(json!({
        "message": "Order placed successfully",
        "orderId": order.id,
        "order": {
            "id": order.id,
            "customerName": order.customer_name,
            "status": order.status,
            "total": order.order_summary.total,
            "orderDate": order.order_date,
        },
    })))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    let orders = state
        .store
        .recent_orders_for(&identity.user_id, PAGE_SIZE)
        .await?;

    let formatted: Vec<Value> = orders
        .iter()
        .map(|order| {
            json!({
                "id": order.id,
                "customerName": order.customer_name,
                "items": order.items,
                "status": order.status,
                "total": order.order_summary.total,
                "orderDate": order.order_date,
                "deliveryAddress": order.delivery_address,
                "restaurantName": order
                    .items
                    .first()
                    .map(|item| item.restaurant_name.as_str())
                    .unwrap_or("Multiple Restaurants"),
            })
        })
        .collect();

    Ok(Json(json!({ "orders": formatted })))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let order = state
        .store
        .find_order(&order_id)
        .await?
        .ok_or(AppError::NotFound("Order not found"))?;

    // Ownership check. A non-owner probing a valid id learns it exists but
    // nothing more; existence hiding is not part of this contract.
    if order.user_id != identity.user_id {
        return Err(AppError::Forbidden("Forbidden"));
    }

    Ok(Json(json!({
        "order": {
            "id": order.id,
            "customerName": order.customer_name,
            "customerEmail": order.customer_email,
            "items": order.items,
            "deliveryAddress": order.delivery_address,
            "orderSummary": order.order_summary,
            "status": order.status,
            "orderDate": order.order_date,
            "total": order.order_summary.total,
        },
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    order_id: Option<String>,
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidJson(body): ValidJson<CancelOrderRequest>,
) -> Result<Json<Value>, AppError> {
    // Permission first: a member is told 403 even before the body is
    // inspected further.
    if !state.permissions.can_cancel_order(&identity.role) {
        return Err(AppError::Forbidden(
            "Insufficient permissions to cancel orders",
        ));
    }

    let order_id = body
        .order_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Order ID is required".into()))?;

    let mut order = state
        .store
        .find_order(&order_id)
        .await?
        .ok_or(AppError::NotFound("Order not found"))?;

    // Read-modify-write without an optimistic guard: two racing cancels
    // both land on the same terminal state.
    order.cancel()?;
    state
        .store
        .update_order_status(&order_id, order.status)
        .await?;

    info!(order_id = %order_id, by = %identity.user_id, "order cancelled");

    Ok(Json(json!({
        "message": "Order cancelled successfully",
        "orderId": order_id,
    })))
}

fn last4(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().collect();
    digits[digits.len().saturating_sub(4)..].iter().collect()
}
