//! Configuration Management
//!
//! Engine configuration and API credential handling.

pub mod credentials;

pub use credentials::{Credentials, SecretString};

use std::path::PathBuf;

/// Default websocket feed endpoint.
pub const DEFAULT_FEED_URL: &str = "wss://ws-feed.gdax.com";

/// Default REST API endpoint (snapshots).
pub const DEFAULT_API_URL: &str = "https://api.gdax.com";

/// Default REST request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`OrderBookEngine`](crate::orderbook::OrderBookEngine).
///
/// Only `product_ids` is required; everything else has a working default
/// (unauthenticated, no heartbeats, no trade log, 10 s REST timeout).
#[derive(Clone, Debug)]
pub struct OrderBookConfig {
    /// Products to track, e.g. `["ETH-USD", "BTC-USD"]`.
    pub product_ids: Vec<String>,
    /// Optional API credentials; the subscribe frame is signed when present.
    pub credentials: Option<Credentials>,
    /// Optional channel list for the subscribe frame.
    pub channels: Option<Vec<String>>,
    /// Ask the feed for heartbeat frames (liveness detection).
    pub use_heartbeat: bool,
    /// Append snapshots and raw frames to this file when set.
    pub trade_log_file_path: Option<PathBuf>,
    /// REST snapshot timeout in seconds.
    pub timeout_secs: u64,
    /// Websocket endpoint; overridable for tests.
    pub feed_url: String,
    /// REST endpoint; overridable for tests.
    pub api_url: String,
}

impl OrderBookConfig {
    pub fn new(product_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            product_ids: product_ids.into_iter().map(Into::into).collect(),
            credentials: None,
            channels: None,
            use_heartbeat: false,
            trade_log_file_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            feed_url: DEFAULT_FEED_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_heartbeat(mut self, on: bool) -> Self {
        self.use_heartbeat = on;
        self
    }

    pub fn with_trade_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.trade_log_file_path = Some(path.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
