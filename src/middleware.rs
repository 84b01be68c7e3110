//! # Session gate
//!
//! Runs in front of every route except the public allow-list. Extracts the
//! `token` cookie, verifies it, and attaches the resulting [`Identity`] to
//! the request as a typed extension. The gate is the only writer of that
//! extension; handlers obtain identity exclusively through the extractor
//! below and must never accept the same fields from any client-supplied
//! channel.
//!
//! Missing, invalid, and expired credentials are rejected identically so
//! the response never reveals why verification failed: browser navigations
//! are redirected to `/login`, API calls get a bare 401.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::ACCEPT, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::warn;

use crate::{error::AppError, models::Identity, state::AppState, token};

/// Cookie carrying the signed credential.
pub const TOKEN_COOKIE: &str = "token";

/// Routes reachable without a credential: landing page plus the signup and
/// login entry points.
const PUBLIC_ROUTES: [&str; 3] = ["/", "/login", "/signup"];

pub async fn session_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if PUBLIC_ROUTES.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let Some(cookie) = jar.get(TOKEN_COOKIE) else {
        return reject(request.headers());
    };

    match token::verify(cookie.value(), state.config.jwt_secret.as_bytes(), Utc::now()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(failure) => {
            // Logged for operators; the response stays uniform.
            warn!(%failure, path = request.uri().path(), "rejected credential");
            reject(request.headers())
        }
    }
}

fn reject(headers: &HeaderMap) -> Response {
    let wants_html = headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        Redirect::to("/login").into_response()
    } else {
        AppError::Unauthenticated.into_response()
    }
}

/// Handler-side identity accessor. Fails closed: a handler reached without
/// passing the gate (misconfiguration) sees 401, never a partial identity.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
