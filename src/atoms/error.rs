// ── wweb Atoms: Error Types ────────────────────────────────────────────────
// Single canonical error enum for the plugin, built with `thiserror`.
//
// Design rules:
//   • Variants follow the containment policy of each boundary: handler and
//     precondition failures are recovered where they occur, send and number
//     failures surface to the caller, only the lifecycle timeout is fatal.
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • No variant carries the sidecar API key in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// TOML config file could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Plugin configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A `SessionHandler` callback failed. Always recovered at the boundary.
    #[error("Handler error: {0}")]
    Handler(String),

    /// A command was used in the wrong context (non-group chat, no quote...).
    /// The message is the explanation sent back to the user.
    #[error("{0}")]
    Precondition(String),

    /// The outbound-send primitive failed.
    #[error("Send error: {0}")]
    Send(String),

    /// The MSISDN could not be parsed at all.
    #[error("Invalid number {raw:?}: {reason}")]
    InvalidNumber { raw: String, reason: String },

    /// Session was not authenticated and ready within the watchdog window.
    #[error("Session not authenticated and ready within {0}s")]
    LifecycleTimeout(u64),

    /// A session-driver operation failed.
    #[error("Driver error: {op}: {message}")]
    Driver { op: String, message: String },

    /// QR payload could not be encoded.
    #[error("QR error: {0}")]
    Qr(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl EngineError {
    /// Create a driver error with operation name and message.
    pub fn driver(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver { op: op.into(), message: message.into() }
    }

    /// Create a precondition error carrying the user-facing explanation.
    pub fn precondition(explanation: impl Into<String>) -> Self {
        Self::Precondition(explanation.into())
    }

    pub fn invalid_number(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNumber { raw: raw.into(), reason: reason.into() }
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All plugin operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_displays_explanation_verbatim() {
        let err = EngineError::precondition("This command can only be used in a group!");
        assert_eq!(err.to_string(), "This command can only be used in a group!");
    }

    #[test]
    fn driver_error_names_operation() {
        let err = EngineError::driver("sendMessage", "(500) boom");
        assert_eq!(err.to_string(), "Driver error: sendMessage: (500) boom");
    }

    #[test]
    fn string_converts_to_other() {
        let err: EngineError = "plain".into();
        assert!(matches!(err, EngineError::Other(ref s) if s == "plain"));
    }
}
