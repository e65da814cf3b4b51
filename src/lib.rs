//! # drumhud-relay
//!
//! Relay server that fans live DAW transport state (play/stop, bar, beat,
//! tempo, timeline position) out to AR HUD display clients.
//!
//! An external poller reads the DAW and posts updates over HTTP; the relay
//! holds the single current state and the loaded project document, and pushes
//! every accepted update to all WebSocket subscribers. A subscriber gets one
//! snapshot on connect and every update after that, in acceptance order.
//! Everything is in-memory; nothing survives a restart by design.
//!
//! ```no_run
//! use drumhud_relay::{RelayServer, ServerConfig, StateStore};
//!
//! #[tokio::main]
//! async fn main() -> drumhud_relay::Result<()> {
//!     let server = RelayServer::new(ServerConfig::default(), StateStore::new());
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod message;
pub mod project;
pub mod registry;
pub mod server;
pub mod session;
pub mod state;

pub use error::{Error, Result};
pub use message::{ProjectId, PushMessage};
pub use project::ProjectDocument;
pub use registry::{RegistryConfig, SubscriberHandle, SubscriberRegistry};
pub use server::{AppState, RelayServer, ServerConfig};
pub use session::{SessionPhase, SubscriberSession};
pub use state::{StateStore, TransportState};
