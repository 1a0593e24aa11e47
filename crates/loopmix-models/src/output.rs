//! Output container and quality tier definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Output container / codec family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// H.264 in MP4, medium preset, faststart
    #[default]
    Mp4,
    /// ProRes in MOV (editing-friendly intermediate)
    Mov,
    /// High-quality H.264 in MOV, slow preset, faststart
    MovH264,
}

impl Container {
    /// File extension for the container.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mov | Container::MovH264 => "mov",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Container::Mp4 => "mp4",
            Container::Mov => "mov",
            Container::MovH264 => "mov_h264",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Container {
    type Err = ContainerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mp4" => Ok(Container::Mp4),
            "mov" => Ok(Container::Mov),
            "mov_h264" => Ok(Container::MovH264),
            _ => Err(ContainerParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown container: {0}")]
pub struct ContainerParseError(String);

/// Output quality tier.
///
/// A missing or unrecognized tier is represented as `None` on the output
/// spec; the encoding profile selector applies the per-family fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Medium,
    High,
    VeryHigh,
    Ultra,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
            QualityTier::VeryHigh => "very_high",
            QualityTier::Ultra => "ultra",
        };
        write!(f, "{name}")
    }
}

impl FromStr for QualityTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "medium" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            "very_high" => Ok(QualityTier::VeryHigh),
            "ultra" => Ok(QualityTier::Ultra),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown quality tier: {0}")]
pub struct TierParseError(String);

/// Where and how the final stream is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutputSpec {
    /// Destination path
    pub path: PathBuf,
    /// Container / codec family
    #[serde(default)]
    pub container: Container,
    /// Quality tier; `None` falls back per codec family
    #[serde(default)]
    pub quality: Option<QualityTier>,
}

impl OutputSpec {
    /// Create a spec with the default container and fallback tier.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            container: Container::default(),
            quality: None,
        }
    }
}
