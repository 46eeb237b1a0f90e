//! Error types for the ingestion engine

use thiserror::Error;

use crate::store::StoreError;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that end the bridge process
///
/// Transient faults never reach this type: the session layer retries
/// transport failures internally and the pipeline drops rejected events.
/// What remains is misconfiguration at startup and store conditions that
/// would fail every subsequent write.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Manager protocol error surfaced outside the retry loop
    #[error("Manager protocol error: {0}")]
    Ami(#[from] amibridge_ami_core::Error),

    /// Store error that made the event stream unpersistable
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Database error during startup (pool construction, schema bootstrap)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BridgeError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
