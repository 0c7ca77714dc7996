//! Engine error taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Why a document could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentOpenFailure {
    #[error("OpenDoc returned no document handle")]
    NoHandle,

    #[error("document layout could not be fetched: {0}")]
    VerificationFailed(String),
}

/// Errors produced while talking to the analytics engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Failed to open document {document}: {reason}")]
    DocumentOpen {
        document: String,
        reason: DocumentOpenFailure,
    },

    #[error("Engine API error {code}: {message}")]
    Engine { code: i64, message: String },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No response to {method} within {timeout:?}")]
    Timeout { method: String, timeout: Duration },

    #[error("Unexpected {method} result: {detail}")]
    UnexpectedResult { method: String, detail: String },

    #[error("No document is open on this connection")]
    NotConnected,

    #[error("Connection is closed")]
    Closed,
}

impl EngineError {
    /// Stable identifier reported to tool callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Connection(_) => "connection_error",
            EngineError::DocumentOpen { .. } => "document_open_error",
            EngineError::Engine { .. } => "engine_error",
            EngineError::Protocol(_) => "protocol_error",
            EngineError::Transport(_) => "transport_error",
            EngineError::Timeout { .. } => "timeout",
            EngineError::UnexpectedResult { .. } => "unexpected_result",
            EngineError::NotConnected => "not_connected",
            EngineError::Closed => "connection_closed",
        }
    }

    /// Fatal errors leave the connection closed; everything else only fails
    /// the call that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Connection(_)
                | EngineError::Protocol(_)
                | EngineError::Transport(_)
                | EngineError::Timeout { .. }
                | EngineError::Closed
        )
    }

    pub(crate) fn unexpected(method: &str, detail: impl Into<String>) -> Self {
        EngineError::UnexpectedResult {
            method: method.to_string(),
            detail: detail.into(),
        }
    }
}
