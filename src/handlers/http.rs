//! Shared application state, index, and health endpoints.

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::Auth;

/// Shared application state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub auth: Auth,
}

impl AppState {
    pub fn auth(&self) -> &Auth {
        &self.auth
    }
}

/// GET / — welcome payload.
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({ "message": "Bienvenue" }))
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "authd" })),
    )
}
