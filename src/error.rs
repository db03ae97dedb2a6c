use thiserror::Error;

/// Error taxonomy for the order book engine.
///
/// Sequence gaps and stale messages are not errors: both are handled
/// inside the apply path (resync and silent skip respectively).
#[derive(Error, Debug)]
pub enum GdaxError {
    /// The feed delivered an `error` frame; carries the server message.
    #[error("feed error: {0}")]
    Feed(String),

    /// A frame with a `type` the engine does not recognise.
    #[error("unknown message type: {0}")]
    UnknownMessageKind(String),

    /// The websocket transport closed or failed mid-read.
    #[error("websocket disconnected")]
    Disconnected,

    /// Snapshot fetch failure: connect error, timeout, or non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame that is not valid JSON or does not match its declared kind.
    #[error("malformed frame: {0}")]
    Protocol(String),

    /// Market-order `change` handling (`new_funds`, or missing `new_size`).
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A protocol contract break, e.g. a `match` whose maker is not at the
    /// head of its price level.
    #[error("book integrity violated: {0}")]
    Integrity(String),

    /// Credentials unusable for signing (secret not base64, wrong key length).
    #[error("signing error: {0}")]
    Signing(String),
}

impl From<reqwest::Error> for GdaxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GdaxError::Transport("request timed out".to_string())
        } else if err.is_connect() {
            GdaxError::Transport(format!("connection failed: {err}"))
        } else if let Some(status) = err.status() {
            GdaxError::Transport(format!("HTTP {status}"))
        } else {
            GdaxError::Transport(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GdaxError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => GdaxError::Disconnected,
            other => GdaxError::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GdaxError {
    fn from(err: serde_json::Error) -> Self {
        GdaxError::Protocol(err.to_string())
    }
}

impl From<std::io::Error> for GdaxError {
    fn from(err: std::io::Error) -> Self {
        GdaxError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GdaxError>;
