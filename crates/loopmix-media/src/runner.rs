//! FFmpeg process supervision.
//!
//! One runner invocation covers one encoder process: spawn, forward both
//! output streams verbatim to the sink, derive percentage progress from
//! `time=` markers, heartbeat when the encoder goes quiet, resolve on exit
//! status. The same runner is reused for every pipeline stage.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::progress::{parse_time_marker, ProgressEvent};
use crate::sink::EventSink;

/// How long the encoder may stay silent before a heartbeat line is emitted.
const HEARTBEAT_AFTER: Duration = Duration::from_secs(5);

/// Runner for FFmpeg commands with log forwarding and progress monitoring.
#[derive(Clone)]
pub struct FfmpegRunner {
    sink: Arc<dyn EventSink>,
}

impl FfmpegRunner {
    /// Create a runner reporting through `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Run one FFmpeg invocation to completion.
    ///
    /// `stage` names the pipeline step for errors and progress events.
    /// `total_secs` is the duration progress is measured against; pass 0.0
    /// when a percentage is not meaningful for this stage.
    pub async fn run(
        &self,
        stage: &str,
        cmd: &FfmpegCommand,
        total_secs: f64,
    ) -> MediaResult<()> {
        let args = cmd.build_args()?;
        let ffmpeg = which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        debug!(stage, "Running: ffmpeg {}", args.join(" "));

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediaError::spawn_failed(stage, e))?;

        // Both pipes were requested above; take() cannot return None here.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let last_marker = Arc::new(Mutex::new(Instant::now()));

        let mut pumps = Vec::new();
        if let Some(stdout) = stdout {
            pumps.push(tokio::spawn(pump_stream(
                stdout,
                self.sink.clone(),
                stage.to_string(),
                total_secs,
                last_marker.clone(),
            )));
        }
        if let Some(stderr) = stderr {
            pumps.push(tokio::spawn(pump_stream(
                stderr,
                self.sink.clone(),
                stage.to_string(),
                total_secs,
                last_marker.clone(),
            )));
        }

        let heartbeat = tokio::spawn(heartbeat_loop(
            self.sink.clone(),
            stage.to_string(),
            last_marker.clone(),
        ));

        let status = child.wait().await;

        // The heartbeat must never outlive the process, success or failure.
        heartbeat.abort();
        for pump in pumps {
            let _ = pump.await;
        }

        let status = status?;
        if status.success() {
            Ok(())
        } else {
            warn!(stage, code = ?status.code(), "FFmpeg exited with failure");
            Err(MediaError::exit_status(stage, status.code()))
        }
    }
}

/// Forward one output stream to the sink, scanning completed lines for
/// progress markers. Chunks are forwarded as received, with no framing
/// guarantee; lines are reassembled only for marker scanning.
async fn pump_stream<R>(
    mut reader: R,
    sink: Arc<dyn EventSink>,
    stage: String,
    total_secs: f64,
    last_marker: Arc<Mutex<Instant>>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut carry = String::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        let chunk = String::from_utf8_lossy(&buf[..n]);
        sink.on_log(&chunk);

        carry.push_str(&chunk);
        for line in drain_complete_lines(&mut carry) {
            if total_secs > 0.0 {
                if let Some(elapsed) = parse_time_marker(&line) {
                    *last_marker.lock().unwrap() = Instant::now();
                    sink.on_progress(&ProgressEvent::from_elapsed(elapsed, total_secs, &stage));
                }
            }
        }
    }
}

/// Split off every complete line (terminated by `\n` or the `\r` ffmpeg uses
/// for its stats updates), leaving the unterminated tail in `carry`.
fn drain_complete_lines(carry: &mut String) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = carry.find(['\n', '\r']) {
        let line: String = carry.drain(..=pos).collect();
        let line = line.trim_end_matches(['\n', '\r']);
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Emit a synthetic log line whenever no progress marker has arrived for
/// [`HEARTBEAT_AFTER`]. Aborted by the runner on process exit.
async fn heartbeat_loop(sink: Arc<dyn EventSink>, stage: String, last_marker: Arc<Mutex<Instant>>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let mut last = last_marker.lock().unwrap();
        if last.elapsed() >= HEARTBEAT_AFTER {
            sink.on_log(&format!("[{stage}] still working...\n"));
            // Restart the silence window so the line repeats every interval,
            // not every tick.
            *last = Instant::now();
        }
    }
}
