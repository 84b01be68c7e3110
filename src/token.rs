//! # Credential codec
//!
//! Issues and verifies the signed session credential. HS256 over a shared
//! secret; the payload carries the identity triple plus issued-at and
//! expiry. Verification is all-or-nothing: a bad signature, a foreign
//! algorithm, a malformed payload, or a past expiry each reject the whole
//! credential.
//!
//! There is no revocation. A credential issued before a role change stays
//! valid until its natural expiry; that is a documented limitation of the
//! design, not something this module papers over.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Identity;

/// Fixed credential lifetime.
pub const VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum VerificationFailure {
    #[error("credential rejected")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("credential missing identity fields")]
    MissingFields,

    #[error("credential expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Signs a credential asserting `identity` until `now + 7 days`.
pub fn issue(
    identity: &Identity,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: identity.user_id.clone(),
        email: identity.email.clone(),
        role: identity.role.clone(),
        iat: now.timestamp(),
        exp: now.timestamp() + VALIDITY_SECS,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Verifies signature and expiry against `now` and returns the embedded
/// identity. Callers must not distinguish the failure variants in anything
/// user-visible.
pub fn verify(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<Identity, VerificationFailure> {
    // Expiry is checked against the caller's clock below, exactly and
    // without leeway.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    let claims = data.claims;

    if claims.sub.is_empty() || claims.email.is_empty() || claims.role.is_empty() {
        return Err(VerificationFailure::MissingFields);
    }
    if now.timestamp() >= claims.exp {
        return Err(VerificationFailure::Expired);
    }

    Ok(Identity {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}
