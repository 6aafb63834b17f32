//! Frame buffer — stateful chunk-to-line re-segmentation.
//!
//! Network reads split the upstream body at arbitrary byte boundaries: in
//! the middle of a line, or even in the middle of a multi-byte character.
//! The buffer re-assembles those chunks into complete protocol lines.
//!
//! Invariant: for the same total bytes, any chunking produces the same
//! sequence of emitted frames. A chunk boundary never duplicates or drops a
//! line.

use crate::frame::Frame;

/// Lifecycle state of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accepting chunks; the pending buffer may hold a partial line.
    Accumulating,
    /// `flush()` has run; the stream is over.
    Flushed,
}

/// Re-segments raw byte chunks into complete protocol frames.
///
/// Exclusively owned by one stream transform; never shared across requests.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Decoded text of the current, incomplete line (may be empty).
    pending: String,
    /// Undecoded trailing bytes of an incomplete UTF-8 sequence (0..=3).
    carry: Vec<u8>,
    state: State,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pending: String::new(),
            carry: Vec::new(),
            state: State::Accumulating,
        }
    }

    /// Feed one raw chunk; returns the complete frames it finishes, in order.
    ///
    /// A chunk containing no line terminator grows the pending buffer and
    /// emits nothing.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        debug_assert_eq!(self.state, State::Accumulating, "feed after flush");

        self.decode(chunk);

        // Split the pending text on '\n'. All segments but the last are
        // complete lines; the last (possibly empty) becomes the new pending
        // buffer regardless of whether the text ended in a terminator.
        let mut frames = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let rest = self.pending.split_off(pos + 1);
            self.pending.pop(); // drop the '\n'
            frames.push(Frame::parse(&self.pending));
            self.pending = rest;
        }
        frames
    }

    /// Emit the pending buffer as a final frame if non-empty, then clear it.
    ///
    /// Called exactly once, at upstream stream end. Any bytes still stuck in
    /// the carry are decoded lossily so nothing is silently dropped.
    pub fn flush(&mut self) -> Option<Frame> {
        debug_assert_eq!(self.state, State::Accumulating, "double flush");
        self.state = State::Flushed;

        if !self.carry.is_empty() {
            let tail = std::mem::take(&mut self.carry);
            self.pending.push_str(&String::from_utf8_lossy(&tail));
        }

        if self.pending.is_empty() {
            None
        } else {
            let line = std::mem::take(&mut self.pending);
            Some(Frame::parse(&line))
        }
    }

    /// Whether any partial line or undecoded bytes are still buffered.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.carry.is_empty()
    }

    /// Incremental UTF-8 decode: prepend the carry, decode as far as
    /// possible, and hold back an incomplete trailing sequence. Invalid
    /// interior bytes decode lossily rather than aborting the stream.
    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes;
        let mut input: &[u8] = if self.carry.is_empty() {
            chunk
        } else {
            bytes = std::mem::take(&mut self.carry);
            bytes.extend_from_slice(chunk);
            &bytes
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.pending.push_str(text);
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    // Safety not needed: re-slice through the checked API.
                    self.pending
                        .push_str(std::str::from_utf8(&input[..valid]).unwrap_or(""));
                    match err.error_len() {
                        // Truncated sequence at the end of the chunk: a
                        // multi-byte character spanning two chunks. Hold the
                        // bytes until the next feed.
                        None => {
                            self.carry = input[valid..].to_vec();
                            return;
                        }
                        // Invalid bytes in the middle: replace and continue.
                        Some(len) => {
                            self.pending.push('\u{FFFD}');
                            input = &input[valid + len..];
                        }
                    }
                }
            }
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
