//! Asterisk Manager Interface (AMI) wire protocol for the amibridge stack
//!
//! This crate handles the byte-level and text-level protocol only; it owns no
//! sockets. The manager speaks a line-oriented text protocol: each message is
//! a run of `Key: Value` lines terminated by a blank line (`\r\n\r\n`).
//! [`FrameBuffer`] turns an arbitrarily segmented byte stream into discrete
//! message blocks, [`RawMessage`] decodes a block into an ordered field
//! mapping, and [`Action`] encodes client requests such as the login
//! handshake.

pub mod action;
pub mod error;
pub mod frame;
pub mod message;

pub use action::Action;
pub use error::{Error, Result};
pub use frame::FrameBuffer;
pub use message::RawMessage;
