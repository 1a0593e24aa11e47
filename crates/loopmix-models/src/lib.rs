//! Shared data models for the loopmix composition pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Visual and audio sources
//! - Logo and text overlays with anchor positions
//! - Output containers and quality tiers
//! - The compose request consumed by the pipeline

pub mod output;
pub mod overlay;
pub mod request;
pub mod source;

// Re-export common types
pub use output::{Container, ContainerParseError, OutputSpec, QualityTier, TierParseError};
pub use overlay::{Anchor, AnchorParseError, LogoOverlay, SimpleOverlay, TextLine};
pub use request::{ComposeRequest, TextLayout, ValidationError};
pub use source::{AudioTrack, MediaSource, SourceKind};
