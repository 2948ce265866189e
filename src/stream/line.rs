//! Newline framing for event-stream bodies.
//!
//! Works like `LinesCodec` from `tokio-util` with two differences: bytes that
//! are not UTF-8 are replaced instead of failing the read, and a line past
//! the length limit is dropped with a warning instead of ending the stream.
//! Only real I/O errors reach the reader.

use std::cmp;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// Longest line kept, in bytes. Token frames are tiny; this leaves room for
/// a large logprobs payload.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct BodyLineCodec {
    max_length: usize,
    // Bytes of the current buffer already known to hold no '\n'.
    next_index: usize,
    discarding: bool,
}

impl BodyLineCodec {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Default for BodyLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BodyLineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> std::io::Result<Option<String>> {
        loop {
            let read_to = cmp::min(self.max_length.saturating_add(1), buf.len());
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let mut line = buf.split_to(end + 1);
                    line.truncate(end);
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
                }
                (false, None) if buf.len() > self.max_length => {
                    crate::warn!(
                        "Skipping stream line longer than {} bytes",
                        self.max_length
                    );
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> std::io::Result<Option<String>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if self.discarding {
            buf.clear();
            self.discarding = false;
            return Ok(None);
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let line = buf.split();
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}
