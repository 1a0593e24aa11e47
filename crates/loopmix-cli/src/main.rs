//! loopmix — compose a looped video from visual sources and audio tracks.
//!
//! Usage:
//!   loopmix --source intro.mp4 --audio a.mp3 --audio b.mp3 --output out.mp4
//!   loopmix --job job.json
//!
//! Either pass individual flags, or a JSON compose request via `--job`.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loopmix_media::{Composer, EventSink, ProgressEvent};
use loopmix_models::{
    Anchor, AudioTrack, ComposeRequest, Container, LogoOverlay, MediaSource, OutputSpec,
    QualityTier, SimpleOverlay, TextLayout, TextLine,
};

#[derive(Parser)]
#[command(
    name = "loopmix",
    about = "Compose a looped video from images/videos and audio tracks",
    version
)]
struct Cli {
    /// Read a full compose request from a JSON file (exclusive with the
    /// per-field flags)
    #[arg(long, conflicts_with_all = ["source", "audio", "output"])]
    job: Option<PathBuf>,

    /// Visual source file (repeatable; image or video, played in order)
    #[arg(short, long = "source", required_unless_present = "job")]
    source: Vec<PathBuf>,

    /// Audio track (repeatable; concatenated in order)
    #[arg(short, long = "audio", required_unless_present = "job")]
    audio: Vec<PathBuf>,

    /// Output file path
    #[arg(short, long, required_unless_present = "job")]
    output: Option<PathBuf>,

    /// Output container: mp4, mov (ProRes) or mov-h264
    #[arg(long, default_value = "mp4")]
    container: String,

    /// Quality tier: medium, high, very-high, ultra
    #[arg(long)]
    quality: Option<String>,

    /// Title line (enables centered-text mode)
    #[arg(long)]
    title: Option<String>,
    #[arg(long, default_value = "64")]
    title_size: u32,

    /// Subtitle line (centered-text mode)
    #[arg(long)]
    subtitle: Option<String>,
    #[arg(long, default_value = "48")]
    subtitle_size: u32,

    /// Tagline line (centered-text mode)
    #[arg(long)]
    tagline: Option<String>,
    #[arg(long, default_value = "36")]
    tagline_size: u32,

    /// Single corner-anchored overlay text (exclusive with --title)
    #[arg(long, conflicts_with = "title")]
    overlay_text: Option<String>,
    #[arg(long, default_value = "48")]
    overlay_size: u32,
    /// Corner for the overlay text: tl, tr, bl, br
    #[arg(long, default_value = "br")]
    overlay_anchor: String,

    /// Disable the semi-transparent box behind text
    #[arg(long)]
    no_text_background: bool,

    /// Logo image composited onto the frame
    #[arg(long)]
    logo: Option<PathBuf>,
    /// Logo width as a fraction of the frame width
    #[arg(long, default_value = "0.3")]
    logo_scale: f64,
    /// Logo opacity in [0, 1]
    #[arg(long, default_value = "0.9")]
    logo_opacity: f64,
    /// Logo anchor: tl, tr, bl, br, center-before-title, center-after-tagline
    #[arg(long, default_value = "br")]
    logo_anchor: String,

    /// Suppress raw encoder output (progress is still shown)
    #[arg(short, long)]
    quiet: bool,
}

/// Sink printing raw encoder output to stderr and progress lines to stdout.
struct ConsoleSink {
    quiet: bool,
}

impl EventSink for ConsoleSink {
    fn on_log(&self, chunk: &str) {
        if !self.quiet {
            eprint!("{chunk}");
        }
    }

    fn on_progress(&self, event: &ProgressEvent) {
        println!(
            "[{}] {:3}%  {:.1}s / {:.1}s",
            event.status, event.percent, event.current_secs, event.total_secs
        );
    }
}

fn build_request(cli: &Cli) -> anyhow::Result<ComposeRequest> {
    if let Some(job_path) = &cli.job {
        let json = std::fs::read_to_string(job_path)
            .with_context(|| format!("Failed to read {}", job_path.display()))?;
        let request: ComposeRequest =
            serde_json::from_str(&json).context("Failed to parse compose request")?;
        return Ok(request);
    }

    let output_path = cli.output.clone().context("--output is required")?;
    let container = Container::from_str(&cli.container)
        .map_err(|e| anyhow::anyhow!("{e} (expected mp4, mov or mov-h264)"))?;

    // Unknown tiers fall back per codec family instead of failing the run.
    let quality = cli.quality.as_deref().and_then(|s| {
        let parsed = QualityTier::from_str(s).ok();
        if parsed.is_none() {
            warn!(tier = s, "Unrecognized quality tier, using the fallback");
        }
        parsed
    });

    let text = if cli.title.is_some() || cli.subtitle.is_some() || cli.tagline.is_some() {
        TextLayout::CenteredStack {
            title: cli
                .title
                .clone()
                .map(|t| TextLine::new(t, cli.title_size)),
            subtitle: cli
                .subtitle
                .clone()
                .map(|t| TextLine::new(t, cli.subtitle_size)),
            tagline: cli
                .tagline
                .clone()
                .map(|t| TextLine::new(t, cli.tagline_size)),
        }
    } else if let Some(overlay) = &cli.overlay_text {
        TextLayout::Corner(SimpleOverlay {
            text: overlay.clone(),
            font_size: cli.overlay_size,
            anchor: Anchor::from_str(&cli.overlay_anchor)?,
        })
    } else {
        TextLayout::None
    };

    let logo = cli
        .logo
        .as_ref()
        .map(|path| -> anyhow::Result<LogoOverlay> {
            Ok(LogoOverlay {
                path: path.clone(),
                scale: cli.logo_scale,
                opacity: cli.logo_opacity,
                anchor: Anchor::from_str(&cli.logo_anchor)?,
            })
        })
        .transpose()?;

    Ok(ComposeRequest {
        sources: cli.source.iter().map(MediaSource::from_path).collect(),
        audio: cli.audio.iter().map(AudioTrack::from_path).collect(),
        output: OutputSpec {
            path: output_path,
            container,
            quality,
        },
        text,
        text_background: !cli.no_text_background,
        logo,
    })
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("loopmix=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let request = build_request(&cli)?;

    let sink = Arc::new(ConsoleSink { quiet: cli.quiet });
    let composer = Composer::new(sink);

    let result = composer.compose(&request).await;
    match &result {
        Ok(()) => println!("{}", serde_json::json!({ "ok": true })),
        Err(e) => println!("{}", serde_json::json!({ "ok": false, "error": e.to_string() })),
    }

    // Exit non-zero on failure, but after reporting the structured result.
    result.map_err(Into::into)
}
