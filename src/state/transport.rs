//! Transport state record
//!
//! The single snapshot of DAW playback the whole system revolves around:
//! play/stop flag, bar/beat position, tempo, timeline position in pulses, and
//! the active time signature. Updates replace the record wholesale; there is
//! no partial merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Playback position and tempo of the DAW at one instant.
///
/// `t_host` is stamped by the store when an update is accepted, so every
/// reader of the same accepted record sees an identical payload. Clients
/// never send it; it is `0.0` on the seeded initial state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    /// Whether the transport is rolling
    pub playing: bool,
    /// Current bar, 1-based
    pub bar: u32,
    /// Current beat within the bar, 1-based
    pub beat: u32,
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Timeline position in pulses per quarter note
    pub ppq: f64,
    /// Time signature numerator
    pub ts_num: u32,
    /// Time signature denominator
    pub ts_den: u32,
    /// Server timestamp in seconds since the Unix epoch, set on accept
    #[serde(default)]
    pub t_host: f64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            playing: false,
            bar: 1,
            beat: 1,
            bpm: 120.0,
            ppq: 0.0,
            ts_num: 4,
            ts_den: 4,
            t_host: 0.0,
        }
    }
}

impl TransportState {
    /// Parse a request body into a candidate state.
    ///
    /// Every field is extracted by hand so that a parse or type failure names
    /// the offending field. Malformed JSON reports field `body`. Unknown keys
    /// are ignored; `t_host` in the input is ignored too (the store stamps
    /// its own).
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::validation("body", format!("invalid JSON: {e}")))?;
        Self::from_json(&value)
    }

    /// Parse an already-decoded JSON value into a candidate state.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::validation("body", "expected a JSON object"))?;

        let state = Self {
            playing: require_bool(obj, "playing")?,
            bar: require_u32(obj, "bar")?,
            beat: require_u32(obj, "beat")?,
            bpm: require_f64(obj, "bpm")?,
            ppq: require_f64(obj, "ppq")?,
            ts_num: require_u32(obj, "ts_num")?,
            ts_den: require_u32(obj, "ts_den")?,
            t_host: 0.0,
        };

        state.validate()?;
        Ok(state)
    }

    /// Structural validation only; musical correctness (e.g. `beat <= ts_num`)
    /// is the producer's business.
    pub fn validate(&self) -> Result<()> {
        if self.bar < 1 {
            return Err(Error::validation("bar", "must be >= 1"));
        }
        if self.beat < 1 {
            return Err(Error::validation("beat", "must be >= 1"));
        }
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(Error::validation("bpm", "must be a finite number > 0"));
        }
        if !self.ppq.is_finite() || self.ppq < 0.0 {
            return Err(Error::validation("ppq", "must be a finite number >= 0"));
        }
        if self.ts_num < 1 {
            return Err(Error::validation("ts_num", "must be >= 1"));
        }
        if self.ts_den < 1 {
            return Err(Error::validation("ts_den", "must be >= 1"));
        }
        Ok(())
    }
}

fn require<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    obj.get(field)
        .ok_or_else(|| Error::validation(field, "missing required field"))
}

fn require_bool(obj: &Map<String, Value>, field: &str) -> Result<bool> {
    require(obj, field)?
        .as_bool()
        .ok_or_else(|| Error::validation(field, "must be a boolean"))
}

fn require_u32(obj: &Map<String, Value>, field: &str) -> Result<u32> {
    let n = require(obj, field)?
        .as_u64()
        .ok_or_else(|| Error::validation(field, "must be an unsigned integer"))?;
    u32::try_from(n).map_err(|_| Error::validation(field, "out of range"))
}

fn require_f64(obj: &Map<String, Value>, field: &str) -> Result<f64> {
    require(obj, field)?
        .as_f64()
        .ok_or_else(|| Error::validation(field, "must be a number"))
}
