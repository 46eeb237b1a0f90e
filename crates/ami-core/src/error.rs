//! Error types for the manager protocol layer

use thiserror::Error;

/// Result type for manager protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the protocol layer
///
/// Decoding is tolerant by contract (malformed lines are skipped, never
/// fatal), so the only failure modes live at the transport boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The peer closed the stream before a complete frame was available
    #[error("manager connection closed")]
    ConnectionClosed,

    /// Transport-level read/write/connect failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
