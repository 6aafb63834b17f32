//! Stream orchestrator — wires the frame buffer into the rewriter.
//!
//! For each complete frame off the buffer: data frames get their payload
//! rewritten and the marker re-attached; control frames pass through
//! verbatim. Frame order is preserved exactly — nothing is reordered,
//! coalesced, or dropped. On upstream end the buffer is flushed and the
//! final frame gets the same dispatch.

use bytes::Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use candor_core::error::StreamError;
use candor_core::provider::ByteStream;

use crate::buffer::FrameBuffer;
use crate::frame::Frame;
use crate::rewrite::Rewriter;

/// One per request. Owns the frame buffer (the only mutable state) and a
/// seedable RNG; the rewriter is shared read-only.
pub struct StreamTransform {
    buffer: FrameBuffer,
    rewriter: Arc<Rewriter>,
    rng: StdRng,
}

impl StreamTransform {
    pub fn new(rewriter: Arc<Rewriter>) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            rewriter,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic variant for tests.
    pub fn with_seed(rewriter: Arc<Rewriter>, seed: u64) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            rewriter,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Process one raw upstream chunk into zero or more output lines, each
    /// carrying its original `'\n'` terminator.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer
            .feed(chunk)
            .into_iter()
            .map(|frame| {
                let mut line = self.dispatch(frame);
                line.push('\n');
                line
            })
            .collect()
    }

    /// Flush the pending buffer at upstream end. The tail never had a
    /// terminator, so none is added.
    pub fn finish(&mut self) -> Option<String> {
        self.buffer.flush().map(|frame| self.dispatch(frame))
    }

    fn dispatch(&mut self, frame: Frame) -> String {
        match frame {
            Frame::Data(payload) => {
                let rewritten = self.rewriter.rewrite_with(&payload, &mut self.rng);
                if rewritten != payload {
                    trace!(original_len = payload.len(), "payload rewritten");
                }
                Frame::Data(rewritten).serialize()
            }
            Frame::Control(line) => line,
        }
    }
}

/// Pump an upstream byte stream through a transform into a downstream
/// channel of output byte chunks.
///
/// Cancellation: if the downstream receiver is dropped, stop pulling from
/// upstream and release the pending buffer without flushing. An upstream
/// error is forwarded as the terminal item — never swallowed.
pub async fn pump(
    mut upstream: ByteStream,
    mut transform: StreamTransform,
    downstream: mpsc::Sender<Result<Bytes, StreamError>>,
) {
    while let Some(chunk) = upstream.recv().await {
        let chunk = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "upstream stream failed");
                let _ = downstream.send(Err(StreamError::Upstream(e))).await;
                return;
            }
        };

        for line in transform.process_chunk(&chunk) {
            if downstream.send(Ok(Bytes::from(line))).await.is_err() {
                debug!("downstream closed, abandoning stream");
                return;
            }
        }
    }

    if let Some(tail) = transform.finish() {
        let _ = downstream.send(Ok(Bytes::from(tail))).await;
    }
}
