//! Project document loading
//!
//! The project file is opaque to the relay: it is parsed once at startup to
//! prove it is JSON and to seed the initial tempo/time signature from its
//! `meta` object, then served back verbatim from the raw bytes so clients
//! see exactly what was on disk.

use std::path::Path;

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::state::TransportState;

/// The project document loaded at startup.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    raw: Bytes,
    value: Value,
}

impl ProjectDocument {
    /// Load and parse a project file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|e| Error::Project {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_bytes(Bytes::from(raw)).map_err(|e| Error::Project {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Build a document from raw JSON bytes.
    pub fn from_bytes(raw: Bytes) -> Result<Self> {
        let value: Value = serde_json::from_slice(&raw)
            .map_err(|e| Error::validation("body", format!("invalid JSON: {e}")))?;
        Ok(Self { raw, value })
    }

    /// The exact bytes read from disk, served verbatim.
    pub fn raw(&self) -> Bytes {
        self.raw.clone()
    }

    /// The parsed document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Build the pre-first-update transport state from the document's `meta`
    /// object: `meta.bpm` (or `meta.tempo`) and `meta.timeSig` as `"N/D"`.
    /// Anything absent or malformed falls back to the documented defaults.
    pub fn seed_state(&self) -> TransportState {
        let mut state = TransportState::default();
        let meta = match self.value.get("meta") {
            Some(meta) => meta,
            None => return state,
        };

        if let Some(bpm) = meta_number(meta, "bpm").or_else(|| meta_number(meta, "tempo")) {
            if bpm.is_finite() && bpm > 0.0 {
                state.bpm = bpm;
            }
        }

        if let Some((num, den)) = meta
            .get("timeSig")
            .and_then(Value::as_str)
            .and_then(parse_time_sig)
        {
            state.ts_num = num;
            state.ts_den = den;
        }

        state
    }
}

/// A meta field may be a number or a numeric string.
fn meta_number(meta: &Value, key: &str) -> Option<f64> {
    match meta.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `"N/D"`; both halves must be positive integers or the whole
/// signature is discarded.
fn parse_time_sig(ts: &str) -> Option<(u32, u32)> {
    let (num, den) = ts.split_once('/')?;
    let num: u32 = num.trim().parse().ok()?;
    let den: u32 = den.trim().parse().ok()?;
    if num < 1 || den < 1 {
        return None;
    }
    Some((num, den))
}
