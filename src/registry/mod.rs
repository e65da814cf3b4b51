//! Subscriber registry for push fan-out
//!
//! The registry manages the live set of push-channel subscribers and routes
//! accepted updates from producers to all of them.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<SubscriberRegistry>
//!                  ┌────────────────────────────┐
//!                  │ subscribers: HashMap<u64,  │
//!                  │   mpsc::Sender<PushMessage>│
//!                  │ >                          │
//!                  └────────────┬───────────────┘
//!                               │ broadcast() = try_send to each
//!            ┌──────────────────┼──────────────────┐
//!            ▼                  ▼                  ▼
//!       [Subscriber]       [Subscriber]       [Subscriber]
//!       rx.recv()          rx.recv()          rx.recv()
//!            │                  │                  │
//!            └──► WebSocket ────┴──► WebSocket ────┘
//! ```
//!
//! A bounded channel per subscriber keeps deliveries independent: `try_send`
//! never awaits, so one stalled connection cannot hold up the rest. Failure
//! policy is drop-and-unregister, never retry.

pub mod config;
pub mod store;

pub use config::RegistryConfig;
pub use store::{SubscriberHandle, SubscriberRegistry};
