//! Push-channel wire messages
//!
//! Everything that travels server-to-client over `/ws/state` is a
//! `PushMessage`, tagged by `type` so a client can tell state updates and
//! selection changes apart on the one channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::TransportState;

/// Opaque identifier naming the active project/song.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Parse an identifier, rejecting the empty string.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::validation("projectId", "must be a non-empty string"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message fanned out to every registered subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushMessage {
    /// A newly accepted transport state (also the connect-time snapshot)
    State(TransportState),
    /// The active project changed
    Selection {
        #[serde(rename = "projectId")]
        project_id: ProjectId,
    },
}

impl PushMessage {
    /// Serialize to the JSON text frame sent on the wire.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_id_rejects_empty() {
        let err = ProjectId::parse("").unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "projectId"));
    }

    #[test]
    fn test_project_id_roundtrip() {
        let id = ProjectId::parse("song-2").unwrap();
        assert_eq!(id.as_str(), "song-2");
        assert_eq!(id.to_string(), "song-2");
    }

    #[test]
    fn test_state_message_tagged() {
        let msg = PushMessage::State(TransportState::default());
        let value: serde_json::Value = serde_json::from_str(&msg.to_text().unwrap()).unwrap();

        assert_eq!(value["type"], json!("state"));
        assert_eq!(value["bar"], json!(1));
        assert_eq!(value["bpm"], json!(120.0));
    }

    #[test]
    fn test_selection_message_tagged() {
        let msg = PushMessage::Selection {
            project_id: ProjectId::parse("song-2").unwrap(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_text().unwrap()).unwrap();

        assert_eq!(value["type"], json!("selection"));
        assert_eq!(value["projectId"], json!("song-2"));
    }

    #[test]
    fn test_messages_deserialize() {
        let msg: PushMessage =
            serde_json::from_value(json!({"type": "selection", "projectId": "intro"})).unwrap();

        assert_eq!(
            msg,
            PushMessage::Selection {
                project_id: ProjectId::parse("intro").unwrap()
            }
        );
    }
}
