//! Error types for the relay client.
//!
//! Every relay failure is reduced to an [`ErrorType`] before it reaches the
//! caller. Transport errors never cross the relay boundary unclassified.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Closed classification of relay failures, as sent on the wire.
/// Unrecognised wire names deserialize to [`ErrorType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
    /// Relay service throttled the caller (`rate-limited`).
    RateLimited,
    /// Sponsorship refused for lack of funds (`balance-required`).
    #[serde(alias = "insufficient-balance")]
    BalanceRequired,
    /// Sender or project is not whitelisted (`whitelist-required`).
    WhitelistRequired,
    /// Anything else, including transport failures and timeouts.
    #[serde(other)]
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::RateLimited => "rate-limited",
            ErrorType::BalanceRequired => "balance-required",
            ErrorType::WhitelistRequired => "whitelist-required",
            ErrorType::Unknown => "unknown",
        }
    }

    /// Heuristic classification of a free-form failure message.
    ///
    /// Only used when the server did not send a structured error.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        if message.contains("429") || message.contains("rate limit") {
            ErrorType::RateLimited
        } else if message.contains("insufficient") || message.contains("balance") {
            ErrorType::BalanceRequired
        } else {
            ErrorType::Unknown
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error body returned by the relay service on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A classified relay failure: error type plus optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub kind: ErrorType,
    pub message: Option<String>,
}

impl RelayError {
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Classify a non-success HTTP response.
    ///
    /// A well-formed `{error, message?}` body is trusted verbatim. Otherwise the
    /// status line is run through [`ErrorType::classify`].
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorResponse>(body) {
            Ok(resp) => Self {
                kind: resp.error,
                message: resp.message,
            },
            Err(_) => {
                let message = format!("HTTP error status: {status}");
                Self::new(ErrorType::classify(&message), message)
            }
        }
    }

    /// Connection-level failure (DNS, refused, reset, TLS).
    pub fn from_transport(err: impl fmt::Display) -> Self {
        Self::new(ErrorType::Unknown, format!("request failed: {err}"))
    }

    /// No response within the configured timeout.
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorType::Unknown,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    /// Success status but a body that does not match the expected envelope.
    pub fn malformed(err: impl fmt::Display) -> Self {
        Self::new(ErrorType::Unknown, format!("invalid relay response: {err}"))
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {msg}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RelayError {}

/// Relay client error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error. Fatal, reported at the point of use.
    #[error("config error: {0}")]
    Config(String),
    /// Account lookup against the network provider failed.
    #[error("provider error: {0}")]
    Provider(String),
    /// Relay exchange failed; already classified.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}

impl Error {
    /// Classified type for relay failures, `None` for config/provider errors.
    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            Error::Relay(e) => Some(e.kind),
            _ => None,
        }
    }
}
