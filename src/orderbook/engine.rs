//! Order book engine
//!
//! Owns one [`ProductBook`] per configured product and keeps them
//! consistent with the exchange: subscribe first, then snapshot each
//! product, then apply the sequenced feed. Frames that race the snapshot
//! fetch queue up in the websocket and are discarded by the sequence
//! filter once the loop starts.
//!
//! Recovery is deliberately blunt: a gap on any product or a transport
//! disconnect throws away every book and rebuilds from fresh snapshots.
//! No splicing, no diffing.

use std::collections::HashMap;
use std::time::Duration;

use futures::future;
use tracing::{debug, info, warn};

use crate::config::OrderBookConfig;
use crate::error::{GdaxError, Result};
use crate::gdax::client::SnapshotClient;
use crate::gdax::types::{FeedMessage, HeartbeatRequest, SubscribeRequest};
use crate::gdax::websocket::FeedClient;
use crate::orderbook::book::{ApplyOutcome, ProductBook};
use crate::orderbook::trade_log::TradeLog;

/// Cap for the reconnect backoff during reinitialisation.
const MAX_RECONNECT_DELAY_SECS: u64 = 30;

pub struct OrderBookEngine {
    config: OrderBookConfig,
    snapshots: SnapshotClient,
    feed: FeedClient,
    books: HashMap<String, ProductBook>,
    trade_log: Option<TradeLog>,
}

impl OrderBookEngine {
    /// Connects, subscribes, snapshots every product, and seeds the books.
    ///
    /// Any transport failure here is fatal; retrying is the caller's
    /// decision at startup. Once running, the engine retries recovery
    /// itself.
    pub async fn start(config: OrderBookConfig) -> Result<Self> {
        let snapshots = SnapshotClient::new(
            &config.api_url,
            Duration::from_secs(config.timeout_secs),
            config.credentials.clone(),
        )?;
        let trade_log = match &config.trade_log_file_path {
            Some(path) => Some(TradeLog::create(path).await?),
            None => None,
        };
        let feed = Self::connect_feed(&config).await?;

        let mut engine = Self {
            config,
            snapshots,
            feed,
            books: HashMap::new(),
            trade_log,
        };
        engine.seed_books().await?;
        Ok(engine)
    }

    /// Opens the websocket and sends the subscribe (signed iff credentials
    /// are configured) and optional heartbeat-enable frames.
    async fn connect_feed(config: &OrderBookConfig) -> Result<FeedClient> {
        let mut feed = FeedClient::connect(&config.feed_url).await?;

        let mut subscribe = SubscribeRequest::new(config.product_ids.clone());
        if let Some(channels) = &config.channels {
            subscribe = subscribe.with_channels(channels.clone());
        }
        if let Some(credentials) = &config.credentials {
            subscribe = subscribe.signed(credentials)?;
        }
        feed.send_frame(&subscribe).await?;

        if config.use_heartbeat {
            feed.send_frame(&HeartbeatRequest::enable()).await?;
        }
        Ok(feed)
    }

    /// Fetches a level-3 snapshot per product concurrently and replaces
    /// the book map wholesale.
    async fn seed_books(&mut self) -> Result<()> {
        let snapshots = &self.snapshots;
        let fetches = self.config.product_ids.iter().map(|product_id| async move {
            let snapshot = snapshots.level3_book(product_id).await?;
            Ok::<_, GdaxError>((product_id.clone(), snapshot))
        });
        let seeded = future::try_join_all(fetches).await?;

        let mut books = HashMap::new();
        for (product_id, snapshot) in seeded {
            if let Some(log) = &mut self.trade_log {
                log.record_snapshot(&product_id, &snapshot).await?;
            }
            info!(
                product_id = %product_id,
                sequence = snapshot.sequence,
                bid_rows = snapshot.bids.len(),
                ask_rows = snapshot.asks.len(),
                "book seeded"
            );
            books.insert(
                product_id.clone(),
                ProductBook::from_snapshot(product_id, &snapshot),
            );
        }
        self.books = books;
        Ok(())
    }

    /// Pulls and applies the next feed message.
    ///
    /// `Ok(Some(message))` is every frame the feed produced, applied or
    /// not (stale frames and frames without a product are passed through
    /// for observation). `Ok(None)` means a recovery just replaced all
    /// book state; call again. Errors are fatal: server error frames,
    /// unknown kinds, protocol breaks, and integrity violations.
    pub async fn next_message(&mut self) -> Result<Option<FeedMessage>> {
        let raw = match self.feed.recv_raw().await {
            Ok(raw) => raw,
            Err(GdaxError::Disconnected) => {
                warn!("feed disconnected, reinitializing");
                self.reinitialize().await?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if let Some(log) = &mut self.trade_log {
            log.record_frame(&raw).await?;
        }

        let message = crate::gdax::types::decode_frame(&raw)?;

        if let FeedMessage::Error { message } = &message {
            return Err(GdaxError::Feed(message.clone()));
        }
        let Some(product_id) = message.product_id() else {
            // subscriptions acknowledgement and the like
            return Ok(Some(message));
        };
        let Some(book) = self.books.get_mut(product_id) else {
            debug!(product_id = %product_id, "frame for an untracked product");
            return Ok(Some(message));
        };

        match book.apply(&message)? {
            ApplyOutcome::Applied | ApplyOutcome::Stale => Ok(Some(message)),
            ApplyOutcome::Gap => {
                info!(product_id = %product_id, "sequence gap, reinitializing");
                self.reinitialize().await?;
                Ok(None)
            }
        }
    }

    /// Tears the feed down and rebuilds everything, retrying transport
    /// failures with capped exponential backoff (1s, 2s, 4s, ... 30s).
    async fn reinitialize(&mut self) -> Result<()> {
        self.feed.close().await;

        let mut attempt: u32 = 0;
        loop {
            match self.try_reinitialize().await {
                Ok(()) => {
                    info!("feed reinitialized");
                    return Ok(());
                }
                Err(err @ (GdaxError::Transport(_) | GdaxError::Disconnected)) => {
                    let delay_secs =
                        std::cmp::min(2u64.saturating_pow(attempt), MAX_RECONNECT_DELAY_SECS);
                    warn!(
                        error = %err,
                        attempt,
                        delay_secs,
                        "reinitialization failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_reinitialize(&mut self) -> Result<()> {
        self.feed = Self::connect_feed(&self.config).await?;
        self.seed_books().await
    }

    pub fn book(&self, product_id: &str) -> Option<&ProductBook> {
        self.books.get(product_id)
    }

    pub fn books(&self) -> impl Iterator<Item = &ProductBook> {
        self.books.values()
    }

    /// Closes the feed and flushes the trade log.
    pub async fn shutdown(mut self) -> Result<()> {
        self.feed.close().await;
        if let Some(log) = self.trade_log.take() {
            log.close().await?;
        }
        Ok(())
    }
}
