//! Frame accumulation for the manager's block-delimited stream
//!
//! The manager terminates every message with a blank line, so the wire
//! delimiter is `\r\n\r\n`. TCP gives no alignment guarantees: a delimiter
//! may straddle two reads, and one read may carry several complete messages.
//! [`FrameBuffer`] absorbs raw chunks in whatever sizes the transport
//! produces them and hands back exactly the blocks that were sent, delimiter
//! stripped, regardless of segmentation.

use bytes::{Buf, BytesMut};

/// End-of-message delimiter on the wire
const DELIMITER: &[u8] = b"\r\n\r\n";

/// Read buffer size the session layer is expected to use per transport read
pub const READ_CHUNK_SIZE: usize = 4096;

/// Sans-I/O accumulator that resegments a byte stream into message blocks
///
/// A block is never emitted before its trailing delimiter has been observed;
/// end-of-stream with a partial block buffered is the caller's signal to
/// raise [`Error::ConnectionClosed`](crate::Error::ConnectionClosed).
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Append one transport read to the buffer
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete block, if one is buffered
    ///
    /// Returns the text before the first delimiter, decoded with UTF-8
    /// replacement (the manager occasionally emits caller-supplied bytes in
    /// legacy encodings). Consecutive delimiters yield empty blocks; those
    /// decode to empty mappings downstream and are filtered there.
    pub fn next_block(&mut self) -> Option<String> {
        let at = find_delimiter(&self.buf)?;
        let block = self.buf.split_to(at);
        self.buf.advance(DELIMITER.len());
        Some(String::from_utf8_lossy(&block).into_owned())
    }

    /// Bytes buffered that do not yet form a complete block
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}
