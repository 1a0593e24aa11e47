//! Logo and text overlay definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Overlay anchor position.
///
/// Corner anchors are valid everywhere; the two center slots only make
/// sense in centered-text mode, where the logo sits above the title or
/// below the tagline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    /// Horizontally centered, above the title block (22% of frame height)
    CenterBeforeTitle,
    /// Horizontally centered, below the tagline block (78% of frame height)
    CenterAfterTagline,
}

impl Anchor {
    /// Whether this is one of the centered-text-mode slots.
    pub fn is_center_slot(&self) -> bool {
        matches!(self, Anchor::CenterBeforeTitle | Anchor::CenterAfterTagline)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Anchor::TopLeft => "top_left",
            Anchor::TopRight => "top_right",
            Anchor::BottomLeft => "bottom_left",
            Anchor::BottomRight => "bottom_right",
            Anchor::CenterBeforeTitle => "center_before_title",
            Anchor::CenterAfterTagline => "center_after_tagline",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Anchor {
    type Err = AnchorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "top_left" | "tl" => Ok(Anchor::TopLeft),
            "top_right" | "tr" => Ok(Anchor::TopRight),
            "bottom_left" | "bl" => Ok(Anchor::BottomLeft),
            "bottom_right" | "br" => Ok(Anchor::BottomRight),
            "center_before_title" => Ok(Anchor::CenterBeforeTitle),
            "center_after_tagline" => Ok(Anchor::CenterAfterTagline),
            _ => Err(AnchorParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown anchor: {0}")]
pub struct AnchorParseError(String);

/// Logo image composited onto the visual stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogoOverlay {
    /// Path to the logo image (PNG with transparency works best)
    pub path: PathBuf,
    /// Width as a fraction of the frame width (height auto-computed)
    #[serde(default = "default_logo_scale")]
    pub scale: f64,
    /// Opacity, clamped to [0, 1] when the filter is built
    #[serde(default = "default_logo_opacity")]
    pub opacity: f64,
    /// Position on the frame
    #[serde(default)]
    pub anchor: Anchor,
}

fn default_logo_scale() -> f64 {
    0.3
}

fn default_logo_opacity() -> f64 {
    0.9
}

impl LogoOverlay {
    /// Create a logo overlay with default scale/opacity/anchor.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scale: default_logo_scale(),
            opacity: default_logo_opacity(),
            anchor: Anchor::default(),
        }
    }

    /// Opacity clamped to the valid [0, 1] range.
    pub fn clamped_opacity(&self) -> f64 {
        self.opacity.clamp(0.0, 1.0)
    }
}

/// One line of the centered text stack (title, subtitle or tagline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TextLine {
    /// Text content; lines with only whitespace are skipped
    pub text: String,
    /// Font size in points
    pub font_size: u32,
}

impl TextLine {
    /// Create a text line.
    pub fn new(text: impl Into<String>, font_size: u32) -> Self {
        Self {
            text: text.into(),
            font_size,
        }
    }

    /// Whether the line has any renderable content.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Single-line corner overlay, mutually exclusive with the centered stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SimpleOverlay {
    /// Text content
    pub text: String,
    /// Font size in points
    pub font_size: u32,
    /// Corner position
    #[serde(default)]
    pub anchor: Anchor,
}
