//! Websocket feed client
//!
//! Thin wrapper over `tokio-tungstenite`: send typed frames, receive raw
//! JSON text. Pings are answered in place; a close frame or transport
//! failure surfaces as [`GdaxError::Disconnected`] so the engine can run
//! its recovery path. There is exactly one consumer per connection.

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{GdaxError, Result};
use crate::gdax::types::{decode_frame, FeedMessage};

pub struct FeedClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedClient {
    /// Opens the websocket. IO or TLS failure is a [`GdaxError::Transport`].
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url).await?;
        info!(url = %url, "feed connected");
        Ok(Self { ws })
    }

    /// Serializes `frame` and sends it as one text message.
    pub async fn send_frame<T: Serialize>(&mut self, frame: &T) -> Result<()> {
        let text = serde_json::to_string(frame)?;
        self.ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Yields the next text frame, raw.
    ///
    /// The engine needs the undecoded text so the trade log can record the
    /// frame byte-for-byte before decoding; [`recv`](Self::recv) layers the
    /// decode on top.
    pub async fn recv_raw(&mut self) -> Result<String> {
        loop {
            let message = match self.ws.next().await {
                Some(Ok(message)) => message,
                Some(Err(err)) => {
                    warn!(error = %err, "websocket read failed");
                    return Err(GdaxError::Disconnected);
                }
                None => return Err(GdaxError::Disconnected),
            };

            match message {
                Message::Text(text) => return Ok(text.to_string()),
                Message::Ping(payload) => {
                    debug!("ping received, sending pong");
                    if self.ws.send(Message::Pong(payload)).await.is_err() {
                        return Err(GdaxError::Disconnected);
                    }
                }
                Message::Pong(_) => {}
                Message::Close(frame) => {
                    info!(frame = ?frame, "close frame received");
                    return Err(GdaxError::Disconnected);
                }
                Message::Binary(_) => {
                    warn!("unexpected binary frame, skipping");
                }
                Message::Frame(_) => {
                    // raw frames are handled internally by tungstenite
                }
            }
        }
    }

    /// Yields the next decoded message.
    pub async fn recv(&mut self) -> Result<FeedMessage> {
        let raw = self.recv_raw().await?;
        decode_frame(&raw)
    }

    /// Closes the connection; errors are ignored, the socket is going away.
    pub async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
