//! Visual source normalization and concatenation.
//!
//! Heterogeneous source lists are reduced to a single playable visual
//! stream. The decision is a pure plan so the branching is testable without
//! spawning anything; execution turns the plan into encoder invocations.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use loopmix_models::MediaSource;

use crate::audio::manifest_contents;
use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::runner::FfmpegRunner;
use crate::scratch::ScratchDir;

/// Fixed length of a clip synthesized from a still image.
pub const STILL_CLIP_SECS: f64 = 5.0;
/// Frame rate of synthesized clips.
pub const STILL_CLIP_FPS: u32 = 25;

/// Encoding used for intermediate artifacts. Quality tiers only apply to the
/// final encode; intermediates favor speed at visually lossless quality.
const INTERMEDIATE_CRF: u8 = 18;
const INTERMEDIATE_PRESET: &str = "fast";

/// The single visual stream downstream stages consume.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSource {
    /// Path to the stream (an input file, or a scratch file when concatenated)
    pub path: PathBuf,
    /// True only when the stream is a bare still image; downstream picks
    /// between "loop a still" and "loop a finite clip" input modes on this.
    pub is_image: bool,
}

/// How a source list will be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizePlan {
    /// Single source, passed through unchanged.
    PassThrough { is_image: bool },
    /// Multiple sources, all images: only the first is used.
    ///
    /// Known simplification carried over from the original behavior; real
    /// slideshow support would need per-image clip synthesis here too.
    FirstImageOnly,
    /// Mixed list with at least one video: images become fixed clips, then
    /// everything is concatenated with a re-encode.
    ConcatMixed,
}

/// Decide how the ordered source list collapses to one stream.
pub fn plan(sources: &[MediaSource]) -> NormalizePlan {
    if sources.len() == 1 {
        return NormalizePlan::PassThrough {
            is_image: sources[0].is_image(),
        };
    }
    if sources.iter().all(|s| s.is_image()) {
        return NormalizePlan::FirstImageOnly;
    }
    NormalizePlan::ConcatMixed
}

/// Normalize the source list into a single visual stream.
pub async fn normalize(
    sources: &[MediaSource],
    scratch: &ScratchDir,
    runner: &FfmpegRunner,
) -> MediaResult<VisualSource> {
    match plan(sources) {
        NormalizePlan::PassThrough { is_image } => Ok(VisualSource {
            path: sources[0].path.clone(),
            is_image,
        }),
        NormalizePlan::FirstImageOnly => {
            warn!(
                count = sources.len(),
                "Multiple image sources without a video: using only the first image"
            );
            Ok(VisualSource {
                path: sources[0].path.clone(),
                is_image: true,
            })
        }
        NormalizePlan::ConcatMixed => concat_mixed(sources, scratch, runner).await,
    }
}

/// Convert every image to a fixed clip, then concatenate the whole list.
async fn concat_mixed(
    sources: &[MediaSource],
    scratch: &ScratchDir,
    runner: &FfmpegRunner,
) -> MediaResult<VisualSource> {
    let mut elements: Vec<PathBuf> = Vec::with_capacity(sources.len());
    let mut total_secs = 0.0;

    for source in sources {
        if source.is_image() {
            let clip = scratch.path("still_clip", "mp4");
            runner
                .run(
                    "converting image",
                    &image_to_clip_command(&source.path, &clip),
                    STILL_CLIP_SECS,
                )
                .await?;
            elements.push(clip);
            total_secs += STILL_CLIP_SECS;
        } else {
            // Videos are re-encoded to silent intermediates so every
            // manifest entry presents the same stream layout to the concat
            // demuxer; synthesized still clips carry no audio stream.
            let secs = probe_duration(&source.path).await;
            let clip = scratch.path("video_clip", "mp4");
            runner
                .run(
                    "normalizing video",
                    &video_to_silent_clip_command(&source.path, &clip),
                    secs,
                )
                .await?;
            elements.push(clip);
            total_secs += secs;
        }
    }

    let manifest_path = scratch.path("visual_list", "txt");
    tokio::fs::write(&manifest_path, manifest_contents(&elements)).await?;

    let concat_path = scratch.path("concat", "mp4");
    info!(
        elements = elements.len(),
        total_secs, "Concatenating visual sources"
    );

    // Re-encode rather than stream-copy so codec and timebase are uniform
    // across heterogeneous elements.
    let cmd = FfmpegCommand::new(&concat_path)
        .concat_input(&manifest_path)
        .video_codec("libx264")
        .crf(INTERMEDIATE_CRF)
        .preset(INTERMEDIATE_PRESET)
        .pixel_format("yuv420p")
        .no_audio();

    runner.run("concatenating sources", &cmd, total_secs).await?;

    Ok(VisualSource {
        path: concat_path,
        is_image: false,
    })
}

/// Build the command that freezes a still image into a fixed-length clip.
fn image_to_clip_command(image: &Path, clip: &Path) -> FfmpegCommand {
    FfmpegCommand::new(clip)
        .looped_image_input(image, STILL_CLIP_FPS)
        .duration(STILL_CLIP_SECS)
        .video_codec("libx264")
        .crf(INTERMEDIATE_CRF)
        .preset(INTERMEDIATE_PRESET)
        .pixel_format("yuv420p")
        .no_audio()
}

/// Build the command that strips audio from a video element.
fn video_to_silent_clip_command(video: &Path, clip: &Path) -> FfmpegCommand {
    FfmpegCommand::new(clip)
        .input(video)
        .video_codec("libx264")
        .crf(INTERMEDIATE_CRF)
        .preset(INTERMEDIATE_PRESET)
        .pixel_format("yuv420p")
        .no_audio()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(path: &str) -> MediaSource {
        MediaSource::from_path(path)
    }

    #[test]
    fn test_plan_single_video() {
        let p = plan(&[video("a.mp4")]);
        assert_eq!(p, NormalizePlan::PassThrough { is_image: false });
    }

    #[test]
    fn test_plan_single_image() {
        let p = plan(&[video("a.png")]);
        assert_eq!(p, NormalizePlan::PassThrough { is_image: true });
    }

    #[test]
    fn test_plan_all_images_uses_first_only() {
        let p = plan(&[video("a.png"), video("b.jpg")]);
        assert_eq!(p, NormalizePlan::FirstImageOnly);
    }

    #[test]
    fn test_plan_mixed_concatenates() {
        let p = plan(&[video("a.png"), video("b.mp4"), video("c.jpg")]);
        assert_eq!(p, NormalizePlan::ConcatMixed);
        let p = plan(&[video("a.mp4"), video("b.mkv")]);
        assert_eq!(p, NormalizePlan::ConcatMixed);
    }

    #[test]
    fn test_video_clip_command_has_uniform_silent_layout() {
        let cmd = video_to_silent_clip_command(Path::new("in.mp4"), Path::new("clip.mp4"));
        let args = cmd.build_args().unwrap();

        // Same codec/pixel-format family as the synthesized still clips,
        // with the audio stream stripped.
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(!args.contains(&"-loop".to_string()));
        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_image_clip_command_shape() {
        let cmd = image_to_clip_command(Path::new("still.png"), Path::new("clip.mp4"));
        let args = cmd.build_args().unwrap();

        let loop_pos = args.iter().position(|a| a == "-loop").unwrap();
        assert_eq!(args[loop_pos + 1], "1");
        let rate_pos = args.iter().position(|a| a == "-framerate").unwrap();
        assert_eq!(args[rate_pos + 1], "25");
        let t_pos = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "5.000");
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
    }
}
