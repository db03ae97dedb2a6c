//! GDAX exchange plumbing
//!
//! Wire types for the websocket feed, the level-3 snapshot client, and
//! request signing. Book state lives in [`crate::orderbook`]; everything
//! here is transport and decoding.

pub mod client;
pub mod sign;
pub mod types;
pub mod websocket;

pub use client::SnapshotClient;
pub use types::{BookSnapshot, FeedMessage, Side, SnapshotOrder};
pub use websocket::FeedClient;
