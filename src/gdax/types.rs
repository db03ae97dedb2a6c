//! GDAX wire types
//!
//! The feed is a heterogeneous stream of JSON frames, decoded into the
//! [`FeedMessage`] sum type. All prices and sizes arrive as decimal strings
//! and are parsed into [`Decimal`] without any float round-trip; `sequence`
//! and `trade_id` are the only integer fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::error::{GdaxError, Result};
use crate::gdax::sign;

/// Order side. Bids are `buy`, asks are `sell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// One decoded feed frame.
///
/// Unknown fields are tolerated (the feed adds informational ones like
/// `time` and `client_oid`); unknown `type` tags are fatal and surface as
/// [`GdaxError::UnknownMessageKind`] from [`decode_frame`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Subscription acknowledgement. Carries no product_id; never applied.
    Subscriptions {
        #[serde(default)]
        channels: Option<serde_json::Value>,
    },
    /// Order accepted by the matching engine but not yet on the book.
    /// Informational only; the book changes when the order `open`s.
    Received {
        product_id: String,
        sequence: u64,
        #[serde(default)]
        order_id: Option<String>,
        #[serde(default)]
        side: Option<Side>,
        #[serde(default)]
        price: Option<Decimal>,
        #[serde(default)]
        size: Option<Decimal>,
        #[serde(default)]
        funds: Option<Decimal>,
        #[serde(default)]
        order_type: Option<String>,
    },
    /// Order is now resting on the book with `remaining_size` left.
    Open {
        product_id: String,
        sequence: u64,
        order_id: String,
        side: Side,
        price: Decimal,
        remaining_size: Decimal,
    },
    /// Order left the book (filled or canceled). Market orders close with
    /// no `price`; they were never resting, so there is nothing to remove.
    Done {
        product_id: String,
        sequence: u64,
        order_id: String,
        side: Side,
        #[serde(default)]
        price: Option<Decimal>,
        #[serde(default)]
        remaining_size: Option<Decimal>,
        #[serde(default)]
        reason: Option<String>,
    },
    /// Trade between the resting maker and an incoming taker.
    Match {
        product_id: String,
        sequence: u64,
        maker_order_id: String,
        #[serde(default)]
        taker_order_id: Option<String>,
        side: Side,
        price: Decimal,
        size: Decimal,
        #[serde(default)]
        trade_id: Option<u64>,
    },
    /// Resting order modified. A missing `price` means the order rests at
    /// the market price of its side. `new_funds` belongs to market orders
    /// and is not implemented.
    Change {
        product_id: String,
        sequence: u64,
        order_id: String,
        side: Side,
        #[serde(default)]
        price: Option<Decimal>,
        #[serde(default)]
        new_size: Option<Decimal>,
        #[serde(default)]
        old_size: Option<Decimal>,
        #[serde(default)]
        new_funds: Option<Decimal>,
        #[serde(default)]
        old_funds: Option<Decimal>,
    },
    /// Liveness frame, sent once per second per product when enabled.
    Heartbeat {
        #[serde(default)]
        product_id: Option<String>,
        #[serde(default)]
        sequence: Option<u64>,
        #[serde(default)]
        last_trade_id: Option<u64>,
    },
    /// Server-reported failure; always fatal.
    Error { message: String },
}

impl FeedMessage {
    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedMessage::Subscriptions { .. } => "subscriptions",
            FeedMessage::Received { .. } => "received",
            FeedMessage::Open { .. } => "open",
            FeedMessage::Done { .. } => "done",
            FeedMessage::Match { .. } => "match",
            FeedMessage::Change { .. } => "change",
            FeedMessage::Heartbeat { .. } => "heartbeat",
            FeedMessage::Error { .. } => "error",
        }
    }

    pub fn product_id(&self) -> Option<&str> {
        match self {
            FeedMessage::Received { product_id, .. }
            | FeedMessage::Open { product_id, .. }
            | FeedMessage::Done { product_id, .. }
            | FeedMessage::Match { product_id, .. }
            | FeedMessage::Change { product_id, .. } => Some(product_id),
            FeedMessage::Heartbeat { product_id, .. } => product_id.as_deref(),
            FeedMessage::Subscriptions { .. } | FeedMessage::Error { .. } => None,
        }
    }

    pub fn sequence(&self) -> Option<u64> {
        match self {
            FeedMessage::Received { sequence, .. }
            | FeedMessage::Open { sequence, .. }
            | FeedMessage::Done { sequence, .. }
            | FeedMessage::Match { sequence, .. }
            | FeedMessage::Change { sequence, .. } => Some(*sequence),
            FeedMessage::Heartbeat { sequence, .. } => *sequence,
            FeedMessage::Subscriptions { .. } | FeedMessage::Error { .. } => None,
        }
    }
}

/// `type` tags the engine understands.
const KNOWN_KINDS: [&str; 8] = [
    "subscriptions",
    "received",
    "open",
    "done",
    "match",
    "change",
    "heartbeat",
    "error",
];

/// Decodes one raw frame.
///
/// Distinguishes the two decode failures the engine treats differently:
/// invalid JSON or a known kind with broken fields is
/// [`GdaxError::Protocol`]; a well-formed frame of a kind we have never
/// seen is [`GdaxError::UnknownMessageKind`].
pub fn decode_frame(raw: &str) -> Result<FeedMessage> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| GdaxError::Protocol("frame has no type field".to_string()))?;
    if !KNOWN_KINDS.contains(&kind) {
        return Err(GdaxError::UnknownMessageKind(kind.to_string()));
    }
    serde_json::from_value(value).map_err(GdaxError::from)
}

/// One row of a level-3 snapshot: `[price, size, order_id]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOrder(pub Decimal, pub Decimal, pub String);

/// A level-3 order book snapshot as served by
/// `GET /products/{product_id}/book?level=3`, and as re-rendered by
/// [`ProductBook::snapshot`](crate::orderbook::ProductBook::snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub sequence: u64,
    pub bids: Vec<SnapshotOrder>,
    pub asks: Vec<SnapshotOrder>,
}

/// Outbound subscribe frame. The signature fields are present iff the
/// feed is authenticated.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    pub product_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl SubscribeRequest {
    pub fn new(product_ids: Vec<String>) -> Self {
        Self {
            kind: "subscribe",
            product_ids,
            channels: None,
            signature: None,
            timestamp: None,
            key: None,
            passphrase: None,
        }
    }

    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Attaches `signature`, `timestamp`, `key`, and `passphrase`.
    ///
    /// The signed request is the canonical `GET /users/self` with an empty
    /// body, per the signing contract for websocket subscriptions.
    pub fn signed(mut self, credentials: &Credentials) -> Result<Self> {
        let timestamp = sign::unix_timestamp();
        let signature = sign::sign(
            &timestamp,
            "GET",
            "/users/self",
            "",
            credentials.api_secret.expose_secret(),
        )?;
        self.signature = Some(signature);
        self.timestamp = Some(timestamp);
        self.key = Some(credentials.api_key.expose_secret().to_string());
        self.passphrase = Some(credentials.passphrase.expose_secret().to_string());
        Ok(self)
    }
}

/// Outbound heartbeat toggle frame.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    pub on: bool,
}

impl HeartbeatRequest {
    pub fn enable() -> Self {
        Self {
            kind: "heartbeat",
            on: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_open_frame() {
        let raw = r#"{"type":"open","side":"sell","price":"2602.22000000","order_id":"26c22ff5-01b1-4ca3-859c-6349d6eb06b4","remaining_size":"0.10000000","product_id":"BTC-USD","sequence":3419023015,"time":"2017-06-25T11:23:14.792000Z"}"#;
        let message = decode_frame(raw).unwrap();
        match message {
            FeedMessage::Open {
                ref product_id,
                sequence,
                ref order_id,
                side,
                price,
                remaining_size,
            } => {
                assert_eq!(product_id, "BTC-USD");
                assert_eq!(sequence, 3419023015);
                assert_eq!(order_id, "26c22ff5-01b1-4ca3-859c-6349d6eb06b4");
                assert_eq!(side, Side::Sell);
                assert_eq!(price, dec!(2602.22000000));
                assert_eq!(remaining_size, dec!(0.10000000));
            }
            other => panic!("expected open, got {}", other.kind()),
        }
    }

    #[test]
    fn decodes_done_frame_with_price() {
        let raw = r#"{"type":"done","side":"sell","order_id":"4eef1226-4b38-422c-a5b1-56def7107f9a","reason":"canceled","product_id":"BTC-USD","price":"2601.76000000","remaining_size":"3.09000000","sequence":3419023013,"time":"2017-06-25T11:23:14.775000Z"}"#;
        match decode_frame(raw).unwrap() {
            FeedMessage::Done { price, reason, .. } => {
                assert_eq!(price, Some(dec!(2601.76000000)));
                assert_eq!(reason.as_deref(), Some("canceled"));
            }
            other => panic!("expected done, got {}", other.kind()),
        }
    }

    #[test]
    fn decodes_done_frame_without_price() {
        let raw = r#"{"type":"done","side":"sell","order_id":"a2","sequence":7,"product_id":"BTC-USD"}"#;
        match decode_frame(raw).unwrap() {
            FeedMessage::Done { price, .. } => assert_eq!(price, None),
            other => panic!("expected done, got {}", other.kind()),
        }
    }

    #[test]
    fn decodes_match_frame() {
        let raw = r#"{"type":"match","maker_order_id":"a2","taker_order_id":"t1","side":"sell","price":"2596.77","size":"0.01","product_id":"BTC-USD","sequence":9,"trade_id":17393422}"#;
        match decode_frame(raw).unwrap() {
            FeedMessage::Match {
                ref maker_order_id,
                side,
                price,
                size,
                trade_id,
                ..
            } => {
                assert_eq!(maker_order_id, "a2");
                assert_eq!(side, Side::Sell);
                assert_eq!(price, dec!(2596.77));
                assert_eq!(size, dec!(0.01));
                assert_eq!(trade_id, Some(17393422));
            }
            other => panic!("expected match, got {}", other.kind()),
        }
    }

    #[test]
    fn decodes_heartbeat_frame() {
        let raw = r#"{"type":"heartbeat","last_trade_id":17393422,"product_id":"BTC-USD","sequence":3419023015,"time":"2017-06-25T11:23:14.838000Z"}"#;
        let message = decode_frame(raw).unwrap();
        assert_eq!(message.kind(), "heartbeat");
        assert_eq!(message.product_id(), Some("BTC-USD"));
        assert_eq!(message.sequence(), Some(3419023015));
    }

    #[test]
    fn decodes_minimal_received_frame() {
        // Stale pre-snapshot residue can be this sparse; it must still
        // decode so the sequence filter can discard it.
        let raw = r#"{"type":"received","product_id":"BTC-USD","sequence":3419033238}"#;
        let message = decode_frame(raw).unwrap();
        assert_eq!(message.kind(), "received");
        assert_eq!(message.sequence(), Some(3419033238));
    }

    #[test]
    fn decodes_subscriptions_frame_without_product() {
        let raw = r#"{"type":"subscriptions","channels":[{"name":"full","product_ids":["BTC-USD"]}]}"#;
        let message = decode_frame(raw).unwrap();
        assert_eq!(message.kind(), "subscriptions");
        assert_eq!(message.product_id(), None);
        assert_eq!(message.sequence(), None);
    }

    #[test]
    fn decodes_error_frame() {
        let raw = r#"{"type":"error","message":"Failed to subscribe"}"#;
        match decode_frame(raw).unwrap() {
            FeedMessage::Error { message } => assert_eq!(message, "Failed to subscribe"),
            other => panic!("expected error, got {}", other.kind()),
        }
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let raw = r#"{"type":"activate","product_id":"BTC-USD","sequence":1}"#;
        match decode_frame(raw) {
            Err(GdaxError::UnknownMessageKind(kind)) => assert_eq!(kind, "activate"),
            other => panic!("expected UnknownMessageKind, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_protocol_error() {
        assert!(matches!(
            decode_frame("{not json"),
            Err(GdaxError::Protocol(_))
        ));
    }

    #[test]
    fn missing_type_is_protocol_error() {
        assert!(matches!(
            decode_frame(r#"{"product_id":"BTC-USD"}"#),
            Err(GdaxError::Protocol(_))
        ));
    }

    #[test]
    fn known_kind_with_broken_fields_is_protocol_error() {
        // open requires a price
        let raw = r#"{"type":"open","side":"sell","order_id":"x","remaining_size":"1","product_id":"BTC-USD","sequence":2}"#;
        assert!(matches!(decode_frame(raw), Err(GdaxError::Protocol(_))));
    }

    #[test]
    fn snapshot_deserializes_with_exact_decimals() {
        let raw = r#"{"sequence":3419033239,"bids":[["2525.00","1.5","b1"]],"asks":[["2596.74","0.2","a1"]]}"#;
        let snapshot: BookSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.sequence, 3419033239);
        assert_eq!(
            snapshot.bids[0],
            SnapshotOrder(dec!(2525.00), dec!(1.5), "b1".to_string())
        );
        assert_eq!(snapshot.asks[0].1, dec!(0.2));
    }

    #[test]
    fn unauthenticated_subscribe_has_no_auth_fields() {
        let frame = SubscribeRequest::new(vec!["ETH-USD".to_string()]);
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "subscribe", "product_ids": ["ETH-USD"]})
        );
    }

    #[test]
    fn signed_subscribe_carries_auth_fields() {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;

        let credentials = Credentials::new("key", BASE64.encode([b'a'; 64]), "phrase");
        let frame = SubscribeRequest::new(vec!["ETH-USD".to_string()])
            .signed(&credentials)
            .unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["key"], "key");
        assert_eq!(json["passphrase"], "phrase");
        assert!(json["signature"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn heartbeat_enable_frame() {
        let json = serde_json::to_value(HeartbeatRequest::enable()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "heartbeat", "on": true}));
    }
}
