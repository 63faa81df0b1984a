//! Documentation of a classroom attendance capture service.
//!
//!
//!
//! # General Flow
//! - Teacher opens `/` and submits email, branch, course name and course code
//! - `/verify-teacher` looks the teacher up and checks one offered course matches all three course fields
//! - Match: the capture page is served, the login script then moves to `/camera-access?<fields>`
//! - No match: 302 to the configured landing page (`REJECT_REDIRECT_URL`)
//! - Capture page streams the camera into a video element, the capture button draws a frame into a canvas
//!   and stores it as a PNG data URL in a hidden field
//! - Submitting posts multipart (branch, courseCode, image) to `/mark-attendance`
//! - Every student enrolled in the course code gets a `Present` record, the response text is alerted
//!
//! Nothing is kept server-side between requests. Branch and course travel in query parameters and
//! form fields, so every step can be replayed on its own.
//!
//!
//!
//! # Security
//!
//! **There is none.** Verification is a lookup on fields anyone can know. It routes the teacher to the
//! right page and nothing more, real deployments need proper authentication in front of this.
//!
//!
//!
//! # Notes
//!
//! ## Branch
//! `/mark-attendance` accepts `branch` but selects students by course code alone. Course codes are
//! assumed globally unique.
//!
//! ## Duplicates
//! Marking the same course twice in a day gives every enrolled student two records. There is no dedup
//! by date.
//!
//! ## Image
//! The captured image is read off the request and dropped. Nothing stores or inspects it.
//!
//!
//!
//! # Setup
//!
//! Environment, all optional.
//! ```sh
//! PORT=3000
//! STORE_URL=redis://127.0.0.1:6379   # or memory://
//! STORE_PREFIX=attendance
//! PUBLIC_DIR=backend/server/public     # defaults to the crate's own public/, set it for deployed binaries
//! REJECT_REDIRECT_URL=https://tara-user-interface.vercel.app/
//! BODY_LIMIT_BYTES=10485760
//! RUST_LOG=info
//! ```
//!
//! Run from the workspace root.
//! ```sh
//! cargo run -p attendance
//! ```
//!
//! Seed once, a second call fails on the duplicate teacher.
//! ```sh
//! curl localhost:3000/seed
//! ```
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;

use error::AppError;
use routes::{capture_handler, login_handler, mark_handler, seed_handler, verify_handler};
use state::State;

pub async fn start_server() -> Result<(), AppError> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    let assets = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route("/", get(login_handler))
        .route("/camera-access", get(capture_handler))
        .route("/verify-teacher", post(verify_handler))
        .route("/mark-attendance", post(mark_handler))
        .route("/seed", get(seed_handler))
        .fallback_service(assets)
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
