//! Protocol logic above the frame layer: the handshake negotiation the
//! panel drives at link start, the status frames the mainboard reports
//! afterwards, and the duplicate-sighting cache the passive listener uses.
//!
//! All protocol constants live in [`protocol`] as payload tables;
//! checksums are attached once at construction, never hardcoded.

pub mod dedup;
pub mod handshake;
pub mod protocol;
pub mod status;

pub use dedup::{DedupCache, DEFAULT_DEDUP_CAPACITY};
pub use handshake::{HandshakeEngine, HandshakeState, Reply, Step, DEFAULT_RETRY_DELAY};
pub use status::{StatusKind, StatusStore};
