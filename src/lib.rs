// Library exports for gdax-orderbook

pub mod config; // Engine configuration and credentials
pub mod error;
pub mod gdax; // Exchange wire types, snapshot client, websocket feed
pub mod orderbook; // Book state and the reconstruction engine

pub use config::{Credentials, OrderBookConfig};
pub use error::{GdaxError, Result};
pub use gdax::{BookSnapshot, FeedMessage, Side};
pub use orderbook::{ApplyOutcome, OrderBookEngine, ProductBook};
