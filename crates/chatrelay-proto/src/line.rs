//! Line-based codec for tokio.
//!
//! Reads and writes newline-terminated UTF-8 lines. Framing is by newline,
//! never by read size, so a command split across TCP segments still arrives
//! as one line.

use std::cmp;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};

/// Default maximum line length, matching the daemon's default read buffer.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// One decoded unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete line with its terminator (`\n` or `\r\n`) removed.
    Line(String),
    /// A line exceeded the limit and was discarded up to its newline.
    Oversized {
        /// The limit that was exceeded, in bytes.
        limit: usize,
    },
}

/// Line-based codec that handles newline-terminated messages.
///
/// Over-long lines are reported once as [`Inbound::Oversized`] and the rest
/// of that line is skipped, after which decoding resumes normally.
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length, terminator excluded
    max_len: usize,
    /// Skipping the tail of an over-long line
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// The configured line limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn finish_line(mut line: BytesMut) -> error::Result<String> {
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        let text = std::str::from_utf8(&line).map_err(ProtocolError::InvalidUtf8)?;
        Ok(text.to_owned())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Inbound;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Inbound>> {
        loop {
            // Never scan further than one byte past the limit.
            let read_to = cmp::min(self.max_len.saturating_add(1), src.len());
            let newline = src[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    src.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    src.advance(read_to);
                    self.next_index = 0;
                    if src.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let mut line = src.split_to(end + 1);
                    line.truncate(end);
                    return Self::finish_line(line).map(|l| Some(Inbound::Line(l)));
                }
                (false, None) if src.len() > self.max_len => {
                    self.discarding = true;
                    return Ok(Some(Inbound::Oversized {
                        limit: self.max_len,
                    }));
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<Inbound>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        // Peer closed mid-line: hand over what we have.
        self.next_index = 0;
        if self.discarding || src.is_empty() {
            src.clear();
            self.discarding = false;
            return Ok(None);
        }
        let line = src.split_to(src.len());
        Self::finish_line(line).map(|l| Some(Inbound::Line(l)))
    }
}

impl<'a> Encoder<&'a str> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: &'a str, dst: &mut BytesMut) -> error::Result<()> {
        dst.reserve(msg.len() + 1);
        dst.put_slice(msg.as_bytes());
        if !msg.ends_with('\n') {
            dst.put_u8(b'\n');
        }
        Ok(())
    }
}
