//! Server error handling
//!
//! Setup and I/O failures only. A request that matches no route is not an
//! error; it is answered by the not-found or method-not-allowed fallback.

use std::io;
use thiserror::Error;
use trellis_core::RouterError;

/// Trellis error type covering all server failure modes
#[derive(Debug, Error)]
pub enum TrellisError {
    /// HTTP server errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Route registration errors
    #[error("Routing error: {0}")]
    Routing(#[from] RouterError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request exceeded the configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Convenient Result type for Trellis operations
pub type TrellisResult<T> = Result<T, TrellisError>;
