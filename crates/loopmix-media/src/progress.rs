//! Progress extraction from the encoder's diagnostic stream.
//!
//! FFmpeg's only progress channel during a plain invocation is the periodic
//! stats line on stderr (`frame=... time=HH:MM:SS.CS ...`). The extraction
//! lives in one function with a narrow contract so it can be fuzzed against
//! malformed lines without touching process supervision.

use serde::{Deserialize, Serialize};

/// Normalized progress event emitted alongside raw log chunks.
///
/// Percent is non-decreasing within one pipeline stage but resets to zero
/// when the next stage starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 0..=100
    pub percent: u8,
    /// Elapsed output time in seconds
    pub current_secs: f64,
    /// Total duration the stage is measured against
    pub total_secs: f64,
    /// Human-readable stage name (e.g. "merging audio", "encoding")
    pub status: String,
}

impl ProgressEvent {
    /// Build an event from elapsed/total seconds.
    ///
    /// `percent = min(100, round(100 * elapsed / total))`; a non-positive
    /// total yields zero percent.
    pub fn from_elapsed(elapsed: f64, total: f64, status: impl Into<String>) -> Self {
        Self {
            percent: percent_of(elapsed, total),
            current_secs: elapsed,
            total_secs: total,
            status: status.into(),
        }
    }
}

/// Percentage of `total` covered by `elapsed`, clamped to 100.
pub fn percent_of(elapsed: f64, total: f64) -> u8 {
    if total <= 0.0 {
        return 0;
    }
    let pct = (100.0 * elapsed / total).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Extract the elapsed seconds from one encoder stats line.
///
/// Scans for a `time=` marker followed by `HH:MM:SS[.fraction]` and returns
/// the elapsed seconds. Returns `None` for lines without a marker, for
/// `time=N/A`, for negative timestamps (ffmpeg emits a sentinel before the
/// first frame) and for anything that does not parse as a clock value.
pub fn parse_time_marker(line: &str) -> Option<f64> {
    let start = line.find("time=")? + "time=".len();
    let rest = &line[start..];
    let token = rest.split_whitespace().next()?;

    if token.starts_with('-') || token == "N/A" {
        return None;
    }

    let mut parts = token.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
