//! Signup, login, and the current-user endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::TOKEN_COOKIE,
    models::{Identity, User},
    password,
    rbac::Role,
    routes::{required, ValidJson},
    state::AppState,
    token,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<SignupRequest>,
) -> Result<Json<Value>, AppError> {
    let first_name = required(body.first_name, "First name is required")?;
    let last_name = required(body.last_name, "Last name is required")?;
    let email = required(body.email, "Email is required")?.to_lowercase();
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".into()))?;

    if !is_plausible_email(&email) {
        return Err(AppError::Validation("Please enter a valid email".into()));
    }
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    let role = match body.role.as_deref() {
        None | Some("") => Role::Member,
        Some(raw) => {
            Role::parse(raw).ok_or_else(|| AppError::Validation(format!("Invalid role: {raw}")))?
        }
    };

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: password::hash(&password),
        first_name,
        last_name,
        role,
        saved_payment_info: None,
        created_at: Utc::now(),
    };
    state.store.insert_user(&user).await?;

    info!(user_id = %user.id, "user created");

    Ok(Json(json!({
        "message": "User created",
        "user": {
            "id": user.id,
            "email": user.email,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "role": user.role,
        },
    })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(AppError::Validation(
            "Email and password are required.".into(),
        ));
    };
    let email = email.trim().to_lowercase();

    // Unknown account and wrong password are indistinguishable.
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .filter(|user| password::verify(&password, &user.password_hash))
        .ok_or(AppError::InvalidCredentials)?;

    let identity = Identity {
        user_id: user.id.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
    };
    let credential = token::issue(&identity, state.config.jwt_secret.as_bytes(), Utc::now())
        .map_err(|e| AppError::Internal(Box::new(e)))?;

    let cookie = Cookie::build((TOKEN_COOKIE, credential))
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(token::VALIDITY_SECS))
        .path("/")
        .build();

    info!(user_id = %user.id, "login");

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "user": {
                "id": user.id,
                "email": user.email,
                "firstName": user.first_name,
                "lastName": user.last_name,
                "role": user.role,
            },
        })),
    ))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Value>, AppError> {
    let user = state
        .store
        .find_user_by_id(&identity.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(json!({
        "user": {
            "id": user.id,
            "userId": user.id,
            "email": user.email,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "role": user.role,
            "roleLabel": user.role.label(),
        },
    })))
}

// Deliberately loose; the document store is the authority on uniqueness
// and the frontend does its own format validation.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
