//! Persisted document shapes and the per-request identity.
//!
//! Wire names are camelCase to match the frontend payloads; the same
//! serialization is used for the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rbac::Role;

/// Verified caller identity for the current request.
///
/// Established exactly once per request by the session gate from a verified
/// credential, then read through the extractor in [`crate::middleware`].
/// Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_payment_info: Option<PaymentProfile>,
    pub created_at: DateTime<Utc>,
}

/// Saved payment profile on a user record. Only the last 4 digits of the
/// card number are ever persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProfile {
    pub card_name: String,
    pub card_number: String,
    pub expiry_date: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

/// Order status. `Delivered` and `Cancelled` are terminal: no transition
/// ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub restaurant_name: String,
}

/// Payment stub carried on an order. The card number is reduced to its
/// last 4 digits before the order is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

/// Caller-supplied summary figures. Accepted as authoritative; the server
/// does not recompute totals from item prices (known integrity gap, kept
/// to match product behavior).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub service_fee: f64,
    pub total: f64,
}

/// A placed order. Owned by `user_id` from creation on; never deleted,
/// only advanced through [`OrderStatus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub payment_details: PaymentDetails,
    pub delivery_address: DeliveryAddress,
    pub order_summary: OrderSummary,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

impl Order {
    /// Moves the order to `Cancelled`. Fails if the current status is
    /// terminal; succeeding twice is impossible because `Cancelled` is
    /// itself terminal.
    pub fn cancel(&mut self) -> Result<(), crate::error::AppError> {
        if self.status.is_terminal() {
            return Err(crate::error::AppError::TerminalOrder(self.status));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}
