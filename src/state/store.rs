//! State store implementation
//!
//! Owns the single current transport state and project selection. All
//! mutation happens under a write lock so readers always see a whole record,
//! never a torn one. The project document slot is fixed at construction and
//! needs no lock at all.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use super::transport::TransportState;
use crate::error::{Error, Result};
use crate::message::ProjectId;
use crate::project::ProjectDocument;

/// Holds the current transport state, the current project selection, and the
/// project document loaded at startup (if any).
///
/// Thread-safe via `RwLock`; reads take a consistent snapshot, writes replace
/// the record wholesale.
pub struct StateStore {
    current: RwLock<TransportState>,
    selection: RwLock<Option<ProjectId>>,
    document: Option<Arc<ProjectDocument>>,
}

impl StateStore {
    /// Create a store seeded with the documented defaults
    /// (stopped, bar 1, beat 1, 120 bpm, ppq 0, 4/4).
    pub fn new() -> Self {
        Self {
            current: RwLock::new(TransportState::default()),
            selection: RwLock::new(None),
            document: None,
        }
    }

    /// Seed the pre-first-update state (e.g. tempo and time signature pulled
    /// from project metadata by the loader).
    pub fn with_initial_state(self, state: TransportState) -> Self {
        Self {
            current: RwLock::new(state),
            ..self
        }
    }

    /// Attach the project document to serve from `GET /api/project`.
    pub fn with_document(self, document: ProjectDocument) -> Self {
        Self {
            document: Some(Arc::new(document)),
            ..self
        }
    }

    /// Snapshot of the most recently accepted state.
    pub async fn state(&self) -> TransportState {
        *self.current.read().await
    }

    /// Validate and atomically replace the current state.
    ///
    /// Stamps `t_host` at the moment of acceptance and returns the accepted
    /// record. On validation failure the stored state is untouched.
    pub async fn set_state(&self, candidate: TransportState) -> Result<TransportState> {
        candidate.validate()?;

        let mut accepted = candidate;
        accepted.t_host = epoch_secs();

        let mut current = self.current.write().await;
        *current = accepted;

        Ok(accepted)
    }

    /// Currently selected project id, if any selection was ever made.
    pub async fn selection(&self) -> Option<ProjectId> {
        self.selection.read().await.clone()
    }

    /// Replace the selection, returning the previous one so callers can tell
    /// whether anything actually changed. Never fails.
    pub async fn set_selection(&self, id: ProjectId) -> Option<ProjectId> {
        let mut selection = self.selection.write().await;
        selection.replace(id)
    }

    /// The document loaded at startup, or `NotLoaded` if none was configured.
    pub fn project_document(&self) -> Result<Arc<ProjectDocument>> {
        self.document.clone().ok_or(Error::NotLoaded)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
