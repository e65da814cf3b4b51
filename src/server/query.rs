//! Query handlers
//!
//! Read-only surface for non-push clients and bootstrap. These never touch
//! the update lock and never mutate anything.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::error::Result;
use crate::state::TransportState;

/// GET /api/health
pub(super) async fn get_health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// GET /api/state
pub(super) async fn get_state(State(app): State<AppState>) -> Json<TransportState> {
    Json(app.store().state().await)
}

/// GET /api/project
///
/// Serves the raw bytes loaded at startup, byte-for-byte.
pub(super) async fn get_project(State(app): State<AppState>) -> Result<Response> {
    let document = app.store().project_document()?;

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        document.raw(),
    )
        .into_response())
}
