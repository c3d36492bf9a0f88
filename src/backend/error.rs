//! Backend error types

use thiserror::Error;

/// Data store error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Status(status), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Decode, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Connection failure or timeout
    Network,
    /// The store answered with an unexpected HTTP status
    Status(u16),
    /// The body did not have the expected shape
    Decode,
}
