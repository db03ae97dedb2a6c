//! REST snapshot client
//!
//! The only REST call the book engine needs: the level-3 order book
//! snapshot. Trading endpoints are a separate concern and not part of
//! this crate.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{GdaxError, Result};
use crate::gdax::sign;
use crate::gdax::types::BookSnapshot;

/// HTTP client for `GET /products/{product_id}/book?level=3`.
///
/// Wraps `reqwest::Client` with the configured base URL, per-request
/// timeout, and optional credentials. When credentials are present every
/// request carries the `CB-ACCESS-*` signature headers.
#[derive(Clone)]
pub struct SnapshotClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for SnapshotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl SnapshotClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gdax-orderbook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GdaxError::from)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    /// Fetches the full level-3 book for one product.
    ///
    /// Level 3 enumerates every resting order as `[price, size, order_id]`;
    /// prices and sizes are parsed from their textual form into exact
    /// decimals. Timeouts and non-2xx statuses surface as
    /// [`GdaxError::Transport`].
    pub async fn level3_book(&self, product_id: &str) -> Result<BookSnapshot> {
        let path = format!("/products/{product_id}/book?level=3");
        let mut request = self.client.get(format!("{}{}", self.base_url, path));

        if let Some(credentials) = &self.credentials {
            let timestamp = sign::unix_timestamp();
            let signature = sign::sign(
                &timestamp,
                "GET",
                &path,
                "",
                credentials.api_secret.expose_secret(),
            )?;
            request = request
                .header("CB-ACCESS-SIGN", signature)
                .header("CB-ACCESS-TIMESTAMP", timestamp)
                .header("CB-ACCESS-KEY", credentials.api_key.expose_secret())
                .header(
                    "CB-ACCESS-PASSPHRASE",
                    credentials.passphrase.expose_secret(),
                );
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(GdaxError::from(response.error_for_status().unwrap_err()));
        }

        let snapshot: BookSnapshot = response.json().await?;
        debug!(
            product_id = %product_id,
            sequence = snapshot.sequence,
            bid_rows = snapshot.bids.len(),
            ask_rows = snapshot.asks.len(),
            "fetched level-3 snapshot"
        );
        Ok(snapshot)
    }
}
