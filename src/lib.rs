//! # Tableside
//!
//! Backend for a food-ordering web app. The interesting part is the
//! authorization and order-lifecycle engine; everything around it is
//! deliberately small.
//!
//! # Request flow
//!
//! - Every request passes the session gate ([`middleware`]), which verifies
//!   the signed `token` cookie ([`token`]) and attaches a typed
//!   [`models::Identity`] to the request. Public routes (`/`, `/login`,
//!   `/signup`) skip the gate.
//! - Handlers read identity through the extractor only, authorize actions
//!   against the fixed role → permission table ([`rbac`]), and apply order
//!   transitions ([`routes::orders`]).
//! - Persistence goes through the [`database::Store`] trait: Redis in
//!   production, in-memory for tests and local runs.
//!
//! # Surface
//!
//! | Route | Method | Auth |
//! |---|---|---|
//! | `/signup`, `/login` | POST | public |
//! | `/auth/me` | GET | credential |
//! | `/orders` | GET, POST, PATCH | credential (+ `cancel_order` for PATCH) |
//! | `/orders/{id}` | GET | credential + ownership |
//! | `/payment-info` | GET, POST | credential |
use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rbac;
pub mod routes;
pub mod state;
pub mod token;

use middleware::session_gate;
use routes::{
    auth::{login, me, signup},
    orders::{cancel_order, create_order, get_order, list_orders},
    payment::{get_payment_info, save_payment_info},
};
use state::AppState;

/// Builds the full router. Split out from [`start_server`] so tests can
/// drive it in-process.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/auth/me", get(me))
        .route(
            "/orders",
            get(list_orders).post(create_order).patch(cancel_order),
        )
        .route("/orders/{id}", get(get_order))
        .route(
            "/payment-info",
            get(get_payment_info).post(save_payment_info),
        )
        .layer(from_fn_with_state(state.clone(), session_gate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
