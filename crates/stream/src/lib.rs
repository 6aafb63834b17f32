//! # Candor Stream
//!
//! The framing-aware stream transform: re-segments arbitrarily chunked
//! upstream bytes into protocol lines, rewrites data payloads per the
//! rewrite policy, and re-serializes protocol-valid output while passing
//! every control line through byte-identical.

pub mod buffer;
pub mod frame;
pub mod patterns;
pub mod rewrite;
pub mod transform;

pub use buffer::FrameBuffer;
pub use frame::{DATA_MARKER, DONE_SENTINEL, Frame};
pub use patterns::PatternTable;
pub use rewrite::{RewriteConfig, Rewriter};
pub use transform::{StreamTransform, pump};
