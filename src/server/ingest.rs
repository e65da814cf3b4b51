//! Ingestion handlers
//!
//! The write side of the HTTP surface, driven by the external transport
//! poller. Bodies are parsed field-by-field so every rejection names the
//! offending field; a rejected body leaves stored state untouched.

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};

use super::AppState;
use crate::error::{Error, Result};
use crate::message::ProjectId;
use crate::state::TransportState;

/// POST /api/state
pub(super) async fn post_state(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>> {
    let candidate = TransportState::from_body(&body)?;
    let accepted = app.apply_state(candidate).await?;

    Ok(Json(json!({ "ok": true, "state": accepted })))
}

/// POST /api/select
pub(super) async fn post_select(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>> {
    let id = parse_selection(&body)?;
    let id = app.apply_selection(id).await?;

    Ok(Json(json!({ "ok": true, "projectId": id })))
}

fn parse_selection(body: &[u8]) -> Result<ProjectId> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::validation("body", format!("invalid JSON: {e}")))?;

    let id = value
        .get("projectId")
        .ok_or_else(|| Error::validation("projectId", "missing required field"))?
        .as_str()
        .ok_or_else(|| Error::validation("projectId", "must be a string"))?;

    ProjectId::parse(id)
}
