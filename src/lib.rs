//! Minimal session-based user-authentication backend.
//!
//! Registration, password login, cookie sessions, profile lookup, and
//! single-use password-reset tokens over a SQLite credential store.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use auth::Auth;
pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Build the API router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/users", post(auth::register))
        .route("/sessions", post(auth::login).delete(auth::logout))
        .route("/profile", get(auth::profile))
        .route(
            "/reset_password",
            post(auth::reset_password_token).put(auth::update_password),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
