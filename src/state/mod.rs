//! Transport state and its store
//!
//! The state store is one of the two shared mutable resources in the relay
//! (the other is the subscriber registry). It holds exactly one
//! `TransportState` at a time; updates replace it wholesale under a write
//! lock and readers always see a complete record.

pub mod store;
pub mod transport;

pub use store::StateStore;
pub use transport::TransportState;
