//! Request signing
//!
//! GDAX signs both REST requests and the websocket subscribe frame with
//! HMAC-SHA256 over `timestamp + method + path + body`, keyed with the
//! base64-decoded API secret. The output is base64-encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{GdaxError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Decoded length of the HMAC key the exchange issues.
const HMAC_KEY_LEN: usize = 64;

/// Signs one request. `api_secret` is the base64 form handed out by the
/// exchange; a secret that does not decode to exactly 64 bytes is rejected
/// here rather than producing a signature the server will refuse.
pub fn sign(
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
    api_secret: &str,
) -> Result<String> {
    let hmac_key = BASE64
        .decode(api_secret)
        .map_err(|err| GdaxError::Signing(format!("api secret is not valid base64: {err}")))?;
    if hmac_key.len() != HMAC_KEY_LEN {
        return Err(GdaxError::Signing(format!(
            "api secret decodes to {} bytes, expected {HMAC_KEY_LEN}",
            hmac_key.len()
        )));
    }

    let mut mac = HmacSha256::new_from_slice(&hmac_key)
        .map_err(|err| GdaxError::Signing(err.to_string()))?;
    mac.update(format!("{timestamp}{method}{path}{body}").as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Current unix time in seconds, as the string the signature and the
/// `CB-ACCESS-TIMESTAMP` header both use.
pub fn unix_timestamp() -> String {
    Utc::now().timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> String {
        BASE64.encode([b'a'; 64])
    }

    #[test]
    fn known_signature() {
        let signature = sign(
            "1493343391.076892",
            "GET",
            "/users/self",
            "",
            &test_secret(),
        )
        .unwrap();
        assert_eq!(signature, "5qne58tAXSW3OJlU/GoC+/mTLF1xgT8vucjJWFZzhsU=");
    }

    #[test]
    fn rejects_short_key() {
        let short = BASE64.encode([b'a'; 32]);
        let err = sign("1", "GET", "/users/self", "", &short).unwrap_err();
        assert!(matches!(err, GdaxError::Signing(_)));
    }

    #[test]
    fn rejects_non_base64_secret() {
        let err = sign("1", "GET", "/users/self", "", "not base64!!!").unwrap_err();
        assert!(matches!(err, GdaxError::Signing(_)));
    }
}
