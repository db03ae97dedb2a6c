//! Append-only trade log
//!
//! Records everything needed to replay a session: one `B` line per
//! snapshot per product, one `W` line per inbound frame (applied or not,
//! byte-for-byte as received). Single writer, owned by the engine;
//! buffered, flushed on shutdown.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::gdax::types::BookSnapshot;

pub struct TradeLog {
    writer: BufWriter<File>,
}

impl TradeLog {
    /// Creates (or truncates) the log file.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path).await?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// `B <product_id> <json-of-snapshot>` line.
    pub async fn record_snapshot(
        &mut self,
        product_id: &str,
        snapshot: &BookSnapshot,
    ) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.writer
            .write_all(format!("B {product_id} {json}\n").as_bytes())
            .await?;
        Ok(())
    }

    /// `W <raw-frame>` line.
    pub async fn record_frame(&mut self, raw: &str) -> Result<()> {
        self.writer
            .write_all(format!("W {raw}\n").as_bytes())
            .await?;
        Ok(())
    }

    /// Flushes buffered records and closes the file.
    pub async fn close(mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}
