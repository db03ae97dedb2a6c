//! API Credential Management
//!
//! Secure handling of GDAX API credentials loaded from environment variables.
//! Credentials are never logged at INFO/WARN levels and are masked when displayed.

use std::fmt;

/// Secure string wrapper that masks sensitive data in logs
///
/// This type wraps sensitive strings (API keys, secrets) and ensures they are
/// never accidentally exposed in logs or error messages. Debug output shows only
/// `SecretString(***)` and Display shows truncated form `first4...last4`.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new SecretString from a String
    pub fn new(value: String) -> Self {
        SecretString(value)
    }

    /// Returns a reference to the inner string
    ///
    /// **Security Warning**: Only use this when actually needed for signing
    /// or request headers. Never log or display the returned value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns a masked version of the secret for safe logging
    ///
    /// Format: `first4...last4` (e.g., "abcd...wxyz")
    pub fn masked(&self) -> String {
        let s = &self.0;
        if s.len() <= 8 {
            return "***".to_string();
        }
        format!("{}...{}", &s[..4], &s[s.len() - 4..])
    }
}

// Debug implementation masks the value completely
impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(***)")
    }
}

// Display implementation shows truncated form
impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString::new(s.to_string())
    }
}

/// GDAX API credentials
///
/// The websocket subscribe frame and the REST snapshot request are signed
/// when credentials are present; the feed runs unauthenticated otherwise.
/// All values are stored as [`SecretString`] to prevent accidental logging.
#[derive(Clone, Debug)]
pub struct Credentials {
    /// API key (public identifier, `CB-ACCESS-KEY`)
    pub api_key: SecretString,
    /// API secret: base64 of the 64-byte HMAC key (`CB-ACCESS-SIGN` input)
    pub api_secret: SecretString,
    /// API passphrase chosen at key creation (`CB-ACCESS-PASSPHRASE`)
    pub passphrase: SecretString,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<SecretString>,
        api_secret: impl Into<SecretString>,
        passphrase: impl Into<SecretString>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Loads credentials from environment variables
    ///
    /// Reads `GDAX_API_KEY`, `GDAX_API_SECRET`, and `GDAX_PASSPHRASE`.
    /// Whitespace is trimmed. Returns `Ok(None)` when none of the variables
    /// are set (unauthenticated mode) and `Err` when only some of them are.
    pub fn from_env() -> Result<Option<Self>, String> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = read("GDAX_API_KEY");
        let api_secret = read("GDAX_API_SECRET");
        let passphrase = read("GDAX_PASSPHRASE");

        match (api_key, api_secret, passphrase) {
            (None, None, None) => Ok(None),
            (Some(key), Some(secret), Some(passphrase)) => {
                Ok(Some(Self::new(key, secret, passphrase)))
            }
            _ => Err(
                "incomplete credentials: set all of GDAX_API_KEY, GDAX_API_SECRET, \
                 and GDAX_PASSPHRASE, or none of them"
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_string_masks_debug_output() {
        let secret = SecretString::from("super-secret-api-key");
        assert_eq!(format!("{:?}", secret), "SecretString(***)");
    }

    #[test]
    fn secret_string_truncates_display() {
        let secret = SecretString::from("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(secret.masked(), "abcd...wxyz");
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        let secret = SecretString::from("short");
        assert_eq!(secret.masked(), "***");
    }
}
