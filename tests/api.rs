//! Black-box tests over the HTTP surface, run against the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tableside::{
    config::{Config, StoreBackend},
    database::MemoryStore,
    models::Identity,
    state::AppState,
    token,
};

const SECRET: &str = "integration-test-secret";

fn test_app() -> Router {
    let config = Config {
        port: 0,
        redis_url: String::new(),
        store: StoreBackend::Memory,
        jwt_secret: SECRET.into(),
        cookie_secure: false,
    };
    tableside::app(AppState::with_store(config, Arc::new(MemoryStore::new())))
}

/// Sends a request and returns (status, json body, token from Set-Cookie).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    let token = set_cookie.and_then(|raw| {
        raw.strip_prefix("token=")
            .and_then(|rest| rest.split(';').next())
            .map(str::to_owned)
    });
    (status, body, token)
}

async fn signup(app: &Router, email: &str, password: &str, role: Option<&str>) {
    let mut body = json!({
        "firstName": "Test",
        "lastName": "User",
        "email": email,
        "password": password,
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, _, _) = send(app, "POST", "/signup", None, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let body = json!({ "email": email, "password": password });
    let (status, _, token) = send(app, "POST", "/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    token.expect("login must set the token cookie")
}

fn order_body() -> Value {
    json!({
        "items": [{
            "id": "i-1",
            "name": "Margherita",
            "price": 14.0,
            "quantity": 1,
            "restaurantName": "Luigi's",
        }],
        "paymentDetails": {
            "cardNumber": "4111111111111111",
            "cardName": "Test User",
            "expiryDate": "12/27",
        },
        "deliveryAddress": {
            "address": "1 Main St",
            "city": "Springfield",
            "zipCode": "11111",
        },
        "orderSummary": {
            "subtotal": 14.0,
            "deliveryFee": 2.0,
            "serviceFee": 1.0,
            "total": 17.0,
        },
        "customerName": "Test User",
    })
}

async fn place_order(app: &Router, token: &str) -> String {
    let (status, body, _) = send(app, "POST", "/orders", Some(token), Some(order_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "confirmed");
    body["orderId"].as_str().unwrap().to_owned()
}

// -------------------------------------------------------------------
// Signup / login

#[tokio::test]
async fn login_sets_cookie_and_reports_member_role() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;

    let (status, body, token) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "user@x.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "member");
    assert!(token.is_some());
}

#[tokio::test]
async fn login_cookie_carries_session_attributes() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "user@x.com", "password": "secret123" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;

    let (status, _, token) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "user@x.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(token.is_none());
}

#[tokio::test]
async fn login_against_unknown_account_is_indistinguishable_from_wrong_password() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;

    let (wrong_pw, body_a, _) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "user@x.com", "password": "wrong" })),
    )
    .await;
    let (unknown, body_b, _) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "ghost@x.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn login_with_missing_fields_is_400() {
    let app = test_app();
    let (status, _, _) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "user@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_rejects_duplicate_email_with_409() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "firstName": "Other",
            "lastName": "Person",
            "email": "user@x.com",
            "password": "different1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_rejects_missing_fields_short_passwords_and_bad_roles() {
    let app = test_app();

    let (status, _, _) = send(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({ "email": "user@x.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "firstName": "Test", "lastName": "User",
            "email": "user@x.com", "password": "short",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({
            "firstName": "Test", "lastName": "User",
            "email": "user@x.com", "password": "secret123",
            "role": "superuser",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -------------------------------------------------------------------
// Session gate

#[tokio::test]
async fn protected_routes_require_a_credential() {
    let app = test_app();

    for (method, uri) in [
        ("GET", "/orders"),
        ("GET", "/orders/some-id"),
        ("GET", "/auth/me"),
        ("GET", "/payment-info"),
    ] {
        let (status, _, _) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn tampered_and_foreign_tokens_are_rejected() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    let mut tampered = token.clone().into_bytes();
    let mid = tampered.len() / 2;
    tampered[mid] = if tampered[mid] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let (status, _, _) = send(&app, "GET", "/orders", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = token::issue(
        &Identity {
            user_id: "u-1".into(),
            email: "user@x.com".into(),
            role: "admin".into(),
        },
        b"some-other-secret",
        Utc::now(),
    )
    .unwrap();
    let (status, _, _) = send(&app, "GET", "/orders", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_credentials_are_rejected() {
    let app = test_app();

    let stale = token::issue(
        &Identity {
            user_id: "u-1".into(),
            email: "user@x.com".into(),
            role: "member".into(),
        },
        SECRET.as_bytes(),
        Utc::now() - Duration::days(8),
    )
    .unwrap();

    let (status, _, _) = send(&app, "GET", "/orders", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn browser_navigation_without_credential_redirects_to_login() {
    let app = test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/orders")
        .header(header::ACCEPT, "text/html,application/xhtml+xml")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

// -------------------------------------------------------------------
// Order creation

#[tokio::test]
async fn create_order_rejects_empty_items() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    let mut body = order_body();
    body["items"] = json!([]);
    let (status, _, _) = send(&app, "POST", "/orders", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_rejects_missing_payment_or_address() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    for missing in ["paymentDetails", "deliveryAddress"] {
        let mut body = order_body();
        body.as_object_mut().unwrap().remove(missing);
        let (status, _, _) = send(&app, "POST", "/orders", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {missing}");
    }
}

#[tokio::test]
async fn create_order_starts_confirmed_and_redacts_card_number() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    let order_id = place_order(&app, &token).await;

    let (status, body, _) =
        send(&app, "GET", &format!("/orders/{order_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "confirmed");
    assert_eq!(body["order"]["total"], 17.0);
    // Full card number must not come back; the store only ever saw 4 digits.
    assert_eq!(
        body["order"].get("paymentDetails"),
        None,
        "payment details are not exposed on reads"
    );
}

// -------------------------------------------------------------------
// Ownership

#[tokio::test]
async fn non_owner_reading_an_order_gets_403_not_404() {
    let app = test_app();
    signup(&app, "a@x.com", "secret123", None).await;
    signup(&app, "b@x.com", "secret123", None).await;
    let token_a = login(&app, "a@x.com", "secret123").await;
    let token_b = login(&app, "b@x.com", "secret123").await;

    let order_id = place_order(&app, &token_a).await;

    let (status, _, _) =
        send(&app, "GET", &format!("/orders/{order_id}"), Some(&token_b), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) =
        send(&app, "GET", &format!("/orders/{order_id}"), Some(&token_a), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_order_id_is_404_for_an_authenticated_caller() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    let (status, _, _) = send(&app, "GET", "/orders/no-such-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_only_contain_the_callers_orders_newest_first_capped_at_ten() {
    let app = test_app();
    signup(&app, "a@x.com", "secret123", None).await;
    signup(&app, "b@x.com", "secret123", None).await;
    let token_a = login(&app, "a@x.com", "secret123").await;
    let token_b = login(&app, "b@x.com", "secret123").await;

    let mut a_ids = Vec::new();
    for _ in 0..12 {
        a_ids.push(place_order(&app, &token_a).await);
    }
    let b_id = place_order(&app, &token_b).await;

    let (status, body, _) = send(&app, "GET", "/orders", Some(&token_a), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["orders"].as_array().unwrap();
    assert_eq!(listed.len(), 10);
    assert_eq!(listed[0]["id"], json!(a_ids.last().unwrap()));
    assert!(listed.iter().all(|o| o["id"] != json!(b_id)));

    let (_, body, _) = send(&app, "GET", "/orders", Some(&token_b), None).await;
    let listed = body["orders"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(b_id));
}

// -------------------------------------------------------------------
// Cancellation

#[tokio::test]
async fn member_cannot_cancel_but_manager_can_cancel_any_order() {
    let app = test_app();
    signup(&app, "member@x.com", "secret123", None).await;
    signup(&app, "manager@x.com", "secret123", Some("manager")).await;
    let member = login(&app, "member@x.com", "secret123").await;
    let manager = login(&app, "manager@x.com", "secret123").await;

    let order_id = place_order(&app, &member).await;

    let (status, _, _) = send(
        &app,
        "PATCH",
        "/orders",
        Some(&member),
        Some(json!({ "orderId": order_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Role-only authority: the manager does not own this order.
    let (status, body, _) = send(
        &app,
        "PATCH",
        "/orders",
        Some(&manager),
        Some(json!({ "orderId": order_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderId"], json!(order_id));

    let (_, body, _) =
        send(&app, "GET", &format!("/orders/{order_id}"), Some(&member), None).await;
    assert_eq!(body["order"]["status"], "cancelled");
}

#[tokio::test]
async fn cancelling_a_terminal_order_conflicts_and_leaves_it_cancelled() {
    let app = test_app();
    signup(&app, "member@x.com", "secret123", None).await;
    signup(&app, "admin@x.com", "secret123", Some("admin")).await;
    let member = login(&app, "member@x.com", "secret123").await;
    let admin = login(&app, "admin@x.com", "secret123").await;

    let order_id = place_order(&app, &member).await;

    let cancel = json!({ "orderId": order_id });
    let (status, _, _) = send(&app, "PATCH", "/orders", Some(&admin), Some(cancel.clone())).await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..2 {
        let (status, body, _) =
            send(&app, "PATCH", "/orders", Some(&admin), Some(cancel.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot cancel order that is cancelled");
    }

    let (_, body, _) =
        send(&app, "GET", &format!("/orders/{order_id}"), Some(&member), None).await;
    assert_eq!(body["order"]["status"], "cancelled");
}

#[tokio::test]
async fn cancel_requires_an_order_id_and_a_known_order() {
    let app = test_app();
    signup(&app, "admin@x.com", "secret123", Some("admin")).await;
    let admin = login(&app, "admin@x.com", "secret123").await;

    let (status, _, _) = send(&app, "PATCH", "/orders", Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "PATCH",
        "/orders",
        Some(&admin),
        Some(json!({ "orderId": "no-such-id" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -------------------------------------------------------------------
// Profile & payment info

#[tokio::test]
async fn me_returns_the_callers_profile() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    let (status, body, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "user@x.com");
    assert_eq!(body["user"]["role"], "member");
    assert_eq!(body["user"]["roleLabel"], "Customer");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn payment_info_round_trips_with_last_four_digits_only() {
    let app = test_app();
    signup(&app, "user@x.com", "secret123", None).await;
    let token = login(&app, "user@x.com", "secret123").await;

    let (status, body, _) = send(&app, "GET", "/payment-info", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentInfo"]["cardNumber"], "");

    let (status, body, _) = send(
        &app,
        "POST",
        "/payment-info",
        Some(&token),
        Some(json!({
            "cardName": "Test User",
            "cardNumber": "4111111111111111",
            "expiryDate": "12/27",
            "address": "1 Main St",
            "city": "Springfield",
            "zipCode": "11111",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentInfo"]["cardNumber"], "1111");

    let (status, _, _) = send(
        &app,
        "POST",
        "/payment-info",
        Some(&token),
        Some(json!({ "cardName": "Test User" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
