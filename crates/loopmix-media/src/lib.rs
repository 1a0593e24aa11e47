//! FFmpeg CLI wrapper and composition pipeline for loopmix.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with option-compatibility checks
//! - Process supervision with verbatim log forwarding, `time=` progress
//!   parsing and a silence heartbeat
//! - Container-duration probing that recovers failures as "unknown"
//! - Audio concatenation and visual normalization into single streams
//! - A graph-as-data filter builder for logo and text compositing
//! - Encoding profile selection per container and quality tier
//!
//! The entry point is [`Composer`], which runs the stages strictly in order
//! and reports raw log chunks and progress events through an injected
//! [`EventSink`].

pub mod audio;
pub mod command;
pub mod compose;
pub mod encode;
pub mod error;
pub mod filtergraph;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod scratch;
pub mod sink;
pub mod visual;

pub use audio::{merge_tracks, MergedAudio};
pub use command::FfmpegCommand;
pub use compose::Composer;
pub use encode::EncodingProfile;
pub use error::{MediaError, MediaResult};
pub use filtergraph::{build_compose_graph, escape_drawtext, FilterGraph, FilterNode, FontSet};
pub use probe::probe_duration;
pub use progress::{parse_time_marker, ProgressEvent};
pub use runner::FfmpegRunner;
pub use scratch::ScratchDir;
pub use sink::{EventSink, NullSink, TracingSink};
pub use visual::{normalize, plan, NormalizePlan, VisualSource};
