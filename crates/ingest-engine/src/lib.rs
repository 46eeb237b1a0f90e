//! Dial-event ingestion engine for the amibridge stack
//!
//! Connects to an Asterisk/Issabel manager interface, follows the event
//! stream, and turns every completed dial attempt into a durable, auditable
//! call record. The flow is one logical stream of control:
//!
//! ```text
//! manager TCP ── session ── extract ── phone ── directory ── store
//!                (frames)   (DialEnd)  (10-digit) (contact)   (Postgres)
//! ```
//!
//! - [`session`] owns the persistent manager connection: login, streaming,
//!   and unbounded reconnection with a configured back-off.
//! - [`extract`] filters the stream down to dial-completion events and
//!   lifts the interesting fields out of the raw mapping.
//! - [`phone`] canonicalizes dialed strings to the 10-digit national form.
//! - [`directory`] correlates a canonical number with a known contact.
//! - [`store`] appends one row per event, raw mapping included, so the
//!   record is auditable even when extraction missed a field.
//! - [`pipeline`] composes the above and narrates matches to the log.
//!
//! The directory and the store are trait seams with Postgres and in-memory
//! implementations; everything up to the seam runs identically in tests
//! against a scripted manager on a loopback socket.

pub mod config;
pub mod directory;
pub mod error;
pub mod extract;
pub mod phone;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod types;

pub use config::{AmiConfig, BridgeConfig, StoreConfig};
pub use directory::{
    ContactDirectory, DirectoryError, MemoryContactDirectory, PgContactDirectory,
};
pub use error::{BridgeError, Result};
pub use pipeline::IngestionPipeline;
pub use session::{SessionManager, SessionState};
pub use store::{CallRecordStore, MemoryCallRecordStore, PgCallRecordStore, StoreError};
pub use types::{CallRecord, ContactMatch, DialCompletionEvent};
