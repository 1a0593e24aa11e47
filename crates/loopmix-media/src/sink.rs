//! Injected log and progress sink.
//!
//! The pipeline never reaches into ambient global state to report; every
//! stage writes raw subprocess output and progress events through a sink
//! handed in at construction. Single consumer, append-only, no backpressure.

use crate::progress::ProgressEvent;

/// Receiver for raw log chunks and progress events.
///
/// Log chunks are forwarded verbatim from the encoder's output streams and
/// may split mid-line. Progress percent may reset to zero when a new
/// pipeline stage begins.
pub trait EventSink: Send + Sync {
    /// A raw chunk of subprocess output (no framing guarantee).
    fn on_log(&self, chunk: &str);

    /// A normalized progress event.
    fn on_progress(&self, event: &ProgressEvent);
}

/// Sink that discards everything. Useful for tests and fire-and-forget runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_log(&self, _chunk: &str) {}
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Sink that forwards to `tracing` at debug/info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_log(&self, chunk: &str) {
        for line in chunk.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "loopmix::encoder", "{line}");
        }
    }

    fn on_progress(&self, event: &ProgressEvent) {
        tracing::info!(
            percent = event.percent,
            current_secs = event.current_secs,
            total_secs = event.total_secs,
            status = %event.status,
            "encode progress"
        );
    }
}
