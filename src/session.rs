//! Push-connection session state machine
//!
//! Tracks one subscriber connection from handshake to teardown. The phases
//! matter for one invariant: unregistration happens exactly once, no matter
//! how the connection ends (client close, transport error, server shutdown).

use std::time::Instant;

use crate::registry::SubscriberHandle;

/// Push-connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Handshake accepted, snapshot not yet delivered
    Connecting,
    /// Registered and receiving broadcasts
    Open,
    /// Torn down; terminal
    Closed,
}

/// State of one subscriber connection
#[derive(Debug)]
pub struct SubscriberSession {
    /// Registry handle for this subscriber
    pub handle: SubscriberHandle,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection-open timestamp
    pub connected_at: Instant,

    /// Broadcast messages forwarded so far
    pub messages_forwarded: u64,
}

impl SubscriberSession {
    /// Create a session in the `Connecting` phase
    pub fn new(handle: SubscriberHandle) -> Self {
        Self {
            handle,
            phase: SessionPhase::Connecting,
            connected_at: Instant::now(),
            messages_forwarded: 0,
        }
    }

    /// Snapshot delivered; start receiving broadcasts
    pub fn open(&mut self) {
        if self.phase == SessionPhase::Connecting {
            self.phase = SessionPhase::Open;
        }
    }

    /// Transition to `Closed`. Returns true exactly once so the caller can
    /// drive a single unregister even if teardown paths race.
    pub fn close(&mut self) -> bool {
        if self.phase == SessionPhase::Closed {
            return false;
        }
        self.phase = SessionPhase::Closed;
        true
    }

    /// Check if the session is receiving broadcasts
    pub fn is_open(&self) -> bool {
        self.phase == SessionPhase::Open
    }

    /// Time since the connection opened
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
