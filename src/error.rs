//! Error types for energenie
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using EnergenieError
pub type Result<T> = std::result::Result<T, EnergenieError>;

/// Unified error type for energenie operations
///
/// Every variant is terminal for the call that produced it: nothing is
/// retried and no partial result is returned.
#[derive(Debug, Error)]
pub enum EnergenieError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// Invalid construction input, detected before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket number or socket spec outside 1-4 (or unparsable)
    #[error("Invalid socket: {0}")]
    InvalidSocket(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    /// The session could not be established (resolve, refuse, connect timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// A read or write inside an established session failed or came up short
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // HTTP Transport Errors
    // -------------------------------------------------------------------------
    /// The HTTP transport failed (connect, timeout, non-success status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
