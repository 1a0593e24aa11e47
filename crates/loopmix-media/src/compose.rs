//! The compose pipeline.
//!
//! One call runs the stages strictly in order — probe/merge audio,
//! normalize the visual sources, build the filter graph, select the
//! encoding profile, run the final encode — with each stage's artifact
//! feeding the next. The first failure aborts the remaining stages.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use loopmix_models::ComposeRequest;

use crate::audio::{merge_tracks, MergedAudio, MERGED_AUDIO_BITRATE};
use crate::command::FfmpegCommand;
use crate::encode::EncodingProfile;
use crate::error::MediaResult;
use crate::filtergraph::{build_compose_graph, FontSet};
use crate::runner::FfmpegRunner;
use crate::scratch::ScratchDir;
use crate::sink::EventSink;
use crate::visual::{normalize, VisualSource};

/// Everything one compose invocation computed before the final encode.
/// Lives only for the duration of the call.
#[derive(Debug)]
struct ComposeJob {
    audio: MergedAudio,
    visual: VisualSource,
}

/// The composition pipeline. Construct once with a sink, call
/// [`Composer::compose`] once per job; the caller is expected to serialize
/// jobs (behavior under concurrent jobs is undefined).
pub struct Composer {
    runner: FfmpegRunner,
    scratch: ScratchDir,
    fonts: FontSet,
}

impl Composer {
    /// Create a composer reporting through `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            runner: FfmpegRunner::new(sink),
            scratch: ScratchDir::default(),
            fonts: FontSet::default(),
        }
    }

    /// Override the scratch directory (defaults to the process temp dir).
    pub fn with_scratch_dir(mut self, scratch: ScratchDir) -> Self {
        self.scratch = scratch;
        self
    }

    /// Override the drawtext font files.
    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    /// Compose one output video.
    ///
    /// Validation failures surface before any subprocess is spawned. Scratch
    /// artifacts are not cleaned up on failure; cleanup is best effort and
    /// belongs to the OS temp directory.
    pub async fn compose(&self, request: &ComposeRequest) -> MediaResult<()> {
        request.validate()?;

        let audio = merge_tracks(&request.audio, &self.scratch, &self.runner).await?;
        let visual = normalize(&request.sources, &self.scratch, &self.runner).await?;
        let job = ComposeJob { audio, visual };

        info!(
            output = %request.output.path.display(),
            container = %request.output.container,
            total_secs = job.audio.total_secs,
            is_image = job.visual.is_image,
            "Starting final encode"
        );

        let cmd = build_final_command(request, &job.visual, &job.audio.path, &self.fonts);
        self.runner
            .run("encoding", &cmd, job.audio.total_secs)
            .await
    }
}

/// Build the final encoder invocation.
///
/// The visual stream loops indefinitely (`-loop 1` for a bare still,
/// `-stream_loop -1` for a finite clip) and `-shortest` trims the output to
/// the audio duration.
fn build_final_command(
    request: &ComposeRequest,
    visual: &VisualSource,
    audio_path: &Path,
    fonts: &FontSet,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(&request.output.path);

    cmd = if visual.is_image {
        cmd.input_with_args(&["-loop", "1"], &visual.path)
    } else {
        cmd.looped_video_input(&visual.path)
    };
    cmd = cmd.input(audio_path);

    let logo_input = if let Some(logo) = &request.logo {
        cmd = cmd.input(&logo.path);
        Some(2usize)
    } else {
        None
    };

    let graph = build_compose_graph(
        visual.is_image,
        request.logo.as_ref(),
        logo_input,
        &request.text,
        request.text_background,
        fonts,
    );

    cmd = if graph.is_empty() {
        cmd.map("0:v:0").map("1:a:0")
    } else {
        cmd.with_filter_graph(graph.to_filter_complex())
            .map(format!("[{}]", graph.cursor()))
            .map("1:a:0")
    };

    let profile = EncodingProfile::select(request.output.container, request.output.quality);
    profile
        .apply_to(cmd)
        .shortest()
        .audio_codec("aac")
        .audio_bitrate(MERGED_AUDIO_BITRATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopmix_models::{
        Anchor, AudioTrack, Container, LogoOverlay, MediaSource, OutputSpec, QualityTier,
        SimpleOverlay, TextLayout, TextLine,
    };
    use std::path::PathBuf;

    fn request(output: &str) -> ComposeRequest {
        ComposeRequest {
            sources: vec![MediaSource::from_path("in.mp4")],
            audio: vec![AudioTrack::from_path("track.mp3")],
            output: OutputSpec::new(output),
            text: TextLayout::None,
            text_background: true,
            logo: None,
        }
    }

    fn video_stream() -> VisualSource {
        VisualSource {
            path: PathBuf::from("in.mp4"),
            is_image: false,
        }
    }

    fn still_stream() -> VisualSource {
        VisualSource {
            path: PathBuf::from("in.png"),
            is_image: true,
        }
    }

    #[test]
    fn test_plain_video_loops_and_trims_to_audio() {
        // One 10s video, 42s of audio, no overlays: loop the video
        // indefinitely and let -shortest trim at the audio's end.
        let req = request("out.mp4");
        let cmd = build_final_command(&req, &video_stream(), Path::new("track.mp3"), &FontSet::default());
        let args = cmd.build_args().unwrap();

        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "-1");
        assert!(args.contains(&"-shortest".to_string()));
        assert!(!args.contains(&"-filter_complex".to_string()));
        assert!(args.contains(&"0:v:0".to_string()));
        assert!(args.contains(&"1:a:0".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_still_with_title_gets_fps_and_one_drawtext() {
        let mut req = request("out.mp4");
        req.sources = vec![MediaSource::from_path("in.png")];
        req.text = TextLayout::CenteredStack {
            title: Some(TextLine::new("Title", 64)),
            subtitle: None,
            tagline: None,
        };

        let cmd = build_final_command(&req, &still_stream(), Path::new("merged.m4a"), &FontSet::default());
        let args = cmd.build_args().unwrap();

        // Still inputs use -loop 1, not -stream_loop.
        assert!(args.contains(&"-loop".to_string()));
        assert!(!args.contains(&"-stream_loop".to_string()));

        let fc = args.iter().position(|a| a == "-filter_complex").unwrap();
        let filter = &args[fc + 1];
        assert!(filter.starts_with("[0:v]fps=24[base]"));
        assert_eq!(filter.matches("drawtext=").count(), 1);
        assert!(args.contains(&"[txt1]".to_string()));
    }

    #[test]
    fn test_logo_becomes_third_input() {
        let mut req = request("out.mp4");
        req.logo = Some(LogoOverlay::from_path("logo.png"));

        let cmd = build_final_command(&req, &video_stream(), Path::new("track.mp3"), &FontSet::default());
        let args = cmd.build_args().unwrap();

        let inputs: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, a)| *a == "-i" && *i > 0)
            .map(|(i, _)| &args[i + 1])
            .collect();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[2], "logo.png");

        let fc = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert!(args[fc + 1].contains("[2:v]format=rgba"));
        assert!(args.contains(&"[with_logo]".to_string()));
    }

    #[test]
    fn test_corner_text_maps_vout() {
        let mut req = request("out.mp4");
        req.text = TextLayout::Corner(SimpleOverlay {
            text: "credit".to_string(),
            font_size: 48,
            anchor: Anchor::TopRight,
        });

        let cmd = build_final_command(&req, &video_stream(), Path::new("track.mp3"), &FontSet::default());
        let args = cmd.build_args().unwrap();
        assert!(args.contains(&"[vout]".to_string()));
    }

    #[test]
    fn test_prores_output_skips_faststart() {
        let mut req = request("out.mov");
        req.output.container = Container::Mov;
        req.output.quality = Some(QualityTier::Ultra);

        let cmd = build_final_command(&req, &video_stream(), Path::new("track.mp3"), &FontSet::default());
        let args = cmd.build_args().unwrap();

        assert!(args.contains(&"prores_ks".to_string()));
        assert!(args.contains(&"yuv422p10le".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn test_audio_always_re_encoded_to_aac() {
        let req = request("out.mp4");
        let cmd = build_final_command(&req, &video_stream(), Path::new("track.mp3"), &FontSet::default());
        let args = cmd.build_args().unwrap();

        let ca = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[ca + 1], "aac");
        let ba = args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(args[ba + 1], "192k");
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_spawning() {
        let sink: Arc<dyn EventSink> = Arc::new(crate::sink::NullSink);
        let composer = Composer::new(sink);

        let mut req = request("out.mp4");
        req.audio.clear();

        let err = composer.compose(&req).await.unwrap_err();
        assert!(matches!(err, crate::error::MediaError::Validation(_)));
    }
}
