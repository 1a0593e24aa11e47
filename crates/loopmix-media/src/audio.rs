//! Audio track merging.
//!
//! One track is used as-is; several tracks are concatenated through the
//! concat demuxer and re-encoded to a single AAC stream. The total duration
//! is the sum of the per-file probes rather than a re-probe of the merged
//! result — an approximation that trades sub-second container overhead for
//! one less subprocess.

use std::path::{Path, PathBuf};
use tracing::info;

use loopmix_models::AudioTrack;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::runner::FfmpegRunner;
use crate::scratch::ScratchDir;

/// Bitrate for the merged AAC stream.
pub const MERGED_AUDIO_BITRATE: &str = "192k";

/// The single audio stream driving the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAudio {
    /// Path to the stream (an input track, or a scratch file when merged)
    pub path: PathBuf,
    /// Sum of the per-track probed durations
    pub total_secs: f64,
}

/// Merge the ordered track list into one audio stream.
pub async fn merge_tracks(
    tracks: &[AudioTrack],
    scratch: &ScratchDir,
    runner: &FfmpegRunner,
) -> MediaResult<MergedAudio> {
    let mut total_secs = 0.0;
    for track in tracks {
        total_secs += probe_duration(&track.path).await;
    }

    if tracks.len() == 1 {
        return Ok(MergedAudio {
            path: tracks[0].path.clone(),
            total_secs,
        });
    }

    let manifest_path = scratch.path("audio_list", "txt");
    let paths: Vec<&Path> = tracks.iter().map(|t| t.path.as_path()).collect();
    tokio::fs::write(&manifest_path, manifest_contents(&paths)).await?;

    let merged_path = scratch.path("merged", "m4a");
    info!(
        tracks = tracks.len(),
        total_secs, "Concatenating audio tracks"
    );

    let cmd = FfmpegCommand::new(&merged_path)
        .concat_input(&manifest_path)
        .audio_codec("aac")
        .audio_bitrate(MERGED_AUDIO_BITRATE);

    runner.run("merging audio", &cmd, total_secs).await?;

    Ok(MergedAudio {
        path: merged_path,
        total_secs,
    })
}

/// Render a concat-demuxer manifest: one `file '<path>'` line per entry,
/// single quotes inside paths escaped as `'\''`.
pub fn manifest_contents<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| {
            let escaped = p.as_ref().to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
