//! Error taxonomy shared by the OSC core, codecs and the session

use thiserror::Error;

/// Errors produced by message construction, codecs and the transport session
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OscError {
    /// Address (or pattern) is empty, lacks the leading `/`, or carries
    /// reserved characters where they are not allowed
    #[error("invalid OSC address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Raw value cannot be represented by the requested tag
    #[error("type mismatch for tag '{tag}': {reason}")]
    TypeMismatch { tag: char, reason: String },

    /// Send attempted while the session is not open
    #[error("session is not connected (state: {state})")]
    NotConnected { state: String },

    /// Codec rejected an outbound message
    #[error("failed to encode OSC message: {0}")]
    EncodeError(String),

    /// Codec rejected an inbound frame
    #[error("failed to decode OSC frame: {0}")]
    DecodeError(String),

    /// A dispatched handler failed; only ever logged, never returned by dispatch
    #[error("handler for '{pattern}' failed: {reason}")]
    HandlerFailure { pattern: String, reason: String },

    /// Endpoint URL is malformed or uses an unsupported scheme
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Connection could not be established
    #[error("connection to {endpoint} failed: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    /// `open` called on a session that was already opened or closed
    #[error("session already started (state: {state})")]
    AlreadyStarted { state: String },

    /// Socket-level failure while writing a frame
    #[error("transport error: {0}")]
    Transport(String),
}

impl OscError {
    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        OscError::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(tag: char, reason: impl Into<String>) -> Self {
        OscError::TypeMismatch {
            tag,
            reason: reason.into(),
        }
    }
}
