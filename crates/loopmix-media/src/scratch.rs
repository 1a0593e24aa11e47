//! Scratch-file naming.
//!
//! Every compose job writes its intermediate artifacts (concat manifests,
//! merged audio, normalized clips) to uniquely-named files in the process
//! temp directory. Names carry a millisecond timestamp plus a per-process
//! counter; cleanup is best effort and never blocks the job.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directory scratch files are written into, resolved per job.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    dir: PathBuf,
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }
}

impl ScratchDir {
    /// Use a specific directory instead of the process temp directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A fresh scratch path like `<dir>/<prefix>_<millis>_<n>.<ext>`.
    ///
    /// The counter disambiguates paths created within the same millisecond;
    /// collisions across concurrently running processes are out of scope.
    pub fn path(&self, prefix: &str, ext: &str) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{prefix}_{millis}_{n}.{ext}"))
    }
}
