//! Container-duration probing via ffprobe.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Probe the container-level duration of a media file, in seconds.
///
/// Asks ffprobe for only the `format=duration` field. Any failure — missing
/// binary, non-zero exit, non-numeric output — is recovered as `0.0` so the
/// caller can treat the duration as "unknown" rather than as an error.
pub async fn probe_duration(path: impl AsRef<Path>) -> f64 {
    let path = path.as_ref();

    let ffprobe = match which::which("ffprobe") {
        Ok(p) => p,
        Err(_) => {
            debug!("ffprobe not found in PATH, reporting duration 0");
            return 0.0;
        }
    };

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(out) if out.status.success() => out,
        Ok(out) => {
            debug!(
                path = %path.display(),
                code = ?out.status.code(),
                "ffprobe failed, reporting duration 0"
            );
            return 0.0;
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ffprobe spawn failed, reporting duration 0");
            return 0.0;
        }
    };

    parse_duration_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ffprobe's single-value duration output. Non-numeric text (including
/// the literal "N/A") becomes `0.0`.
fn parse_duration_output(stdout: &str) -> f64 {
    stdout.trim().parse::<f64>().unwrap_or(0.0)
}
