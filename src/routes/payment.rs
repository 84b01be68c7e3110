//! Saved payment profile. The card number is reduced to its last 4 digits
//! before anything touches the store.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{Identity, PaymentProfile},
    routes::{required, ValidJson},
    state::AppState,
};

pub async fn get_payment_info(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    let user = state
        .store
        .find_user_by_id(&identity.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(json!({
        "paymentInfo": user.saved_payment_info.unwrap_or_default(),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePaymentRequest {
    card_name: Option<String>,
    card_number: Option<String>,
    expiry_date: Option<String>,
    address: Option<String>,
    city: Option<String>,
    zip_code: Option<String>,
}

pub async fn save_payment_info(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidJson(body): ValidJson<SavePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    const MISSING: &str = "All payment fields are required";

    let card_name = required(body.card_name, MISSING)?;
    let card_number = required(body.card_number, MISSING)?;
    let expiry_date = required(body.expiry_date, MISSING)?;
    let address = required(body.address, MISSING)?;
    let city = required(body.city, MISSING)?;
    let zip_code = required(body.zip_code, MISSING)?;

    let digits: Vec<char> = card_number.chars().collect();
    let last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();

    let profile = PaymentProfile {
        card_name,
        card_number: last4,
        expiry_date,
        address,
        city,
        zip_code,
    };

    let user = state
        .store
        .update_payment_info(&identity.user_id, &profile)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(json!({
        "message": "Payment information saved successfully",
        "paymentInfo": user.saved_payment_info,
    })))
}
