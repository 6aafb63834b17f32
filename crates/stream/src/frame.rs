//! Protocol frame model.
//!
//! One frame is one line of the SSE-style wire protocol. Data lines carry a
//! rewritable payload behind the `data: ` marker; everything else — the
//! `data: [DONE]` terminal sentinel, blank separator lines, `event:` lines,
//! comments — is a control frame and must round-trip byte-identical.

/// The fixed marker that opens a data line.
pub const DATA_MARKER: &str = "data: ";

/// The terminal sentinel payload. A line whose payload equals this signals
/// end-of-stream and must never be rewritten.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A single line of the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A data line. Holds the payload only (marker stripped).
    Data(String),
    /// Any other line, stored verbatim. Includes the sentinel line and
    /// blank separators.
    Control(String),
}

impl Frame {
    /// Classify one complete line.
    ///
    /// A line is a data frame iff it starts with the marker and its payload
    /// (everything after the marker) is not exactly the sentinel token.
    pub fn parse(line: &str) -> Self {
        match line.strip_prefix(DATA_MARKER) {
            Some(payload) if payload != DONE_SENTINEL => Frame::Data(payload.to_string()),
            _ => Frame::Control(line.to_string()),
        }
    }

    /// Re-serialize the frame to its wire line (no terminator).
    pub fn serialize(&self) -> String {
        match self {
            Frame::Data(payload) => format!("{DATA_MARKER}{payload}"),
            Frame::Control(line) => line.clone(),
        }
    }

    /// Whether this is the terminal sentinel line.
    pub fn is_done(&self) -> bool {
        matches!(self, Frame::Control(line) if line.strip_prefix(DATA_MARKER) == Some(DONE_SENTINEL))
    }
}
