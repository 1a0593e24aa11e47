//! The compose request consumed by the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::OutputSpec;
use crate::overlay::{LogoOverlay, SimpleOverlay, TextLine};
use crate::source::{AudioTrack, MediaSource};

/// Text overlay layout. The two rendering modes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TextLayout {
    /// No text overlay
    #[default]
    None,
    /// Horizontally centered stack of up to three lines
    CenteredStack {
        #[serde(default)]
        title: Option<TextLine>,
        #[serde(default)]
        subtitle: Option<TextLine>,
        #[serde(default)]
        tagline: Option<TextLine>,
    },
    /// Single line anchored to a corner
    Corner(SimpleOverlay),
}

impl TextLayout {
    /// Whether the centered-stack mode is active.
    pub fn is_centered(&self) -> bool {
        matches!(self, TextLayout::CenteredStack { .. })
    }

    /// Non-blank stack lines in fixed top-to-bottom order, each paired with
    /// its slot index (0 = title, 1 = subtitle, 2 = tagline).
    ///
    /// The slot survives filtering so a line keeps its vertical position
    /// even when the lines above it are absent. Returns an empty vector for
    /// the corner and none layouts.
    pub fn stack_lines(&self) -> Vec<(usize, &TextLine)> {
        match self {
            TextLayout::CenteredStack {
                title,
                subtitle,
                tagline,
            } => [title, subtitle, tagline]
                .into_iter()
                .enumerate()
                .filter_map(|(slot, line)| line.as_ref().map(|l| (slot, l)))
                .filter(|(_, line)| !line.is_blank())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Everything the pipeline needs for one compose call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComposeRequest {
    /// Visual sources in playback order (at least one)
    pub sources: Vec<MediaSource>,
    /// Audio tracks in concatenation order (at least one)
    pub audio: Vec<AudioTrack>,
    /// Output destination and encoding selection
    pub output: OutputSpec,
    /// Text overlay layout
    #[serde(default)]
    pub text: TextLayout,
    /// Draw a semi-transparent box behind text overlays
    #[serde(default = "default_text_background")]
    pub text_background: bool,
    /// Optional logo overlay
    #[serde(default)]
    pub logo: Option<LogoOverlay>,
}

fn default_text_background() -> bool {
    true
}

impl ComposeRequest {
    /// Check the request before any subprocess is spawned.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sources.is_empty() {
            return Err(ValidationError::NoVisualSource);
        }
        if self.audio.is_empty() {
            return Err(ValidationError::NoAudioTrack);
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(ValidationError::NoOutputPath);
        }
        match &self.text {
            TextLayout::CenteredStack { .. } => {
                if self
                    .text
                    .stack_lines()
                    .iter()
                    .any(|(_, line)| line.font_size == 0)
                {
                    return Err(ValidationError::ZeroFontSize);
                }
            }
            TextLayout::Corner(overlay) => {
                if !overlay.text.trim().is_empty() && overlay.font_size == 0 {
                    return Err(ValidationError::ZeroFontSize);
                }
            }
            TextLayout::None => {}
        }
        Ok(())
    }
}

/// Request problems surfaced before the pipeline starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("At least one visual source is required")]
    NoVisualSource,

    #[error("At least one audio track is required")]
    NoAudioTrack,

    #[error("An output path is required")]
    NoOutputPath,

    #[error("Text font size must be greater than zero")]
    ZeroFontSize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Anchor;

    fn minimal_request() -> ComposeRequest {
        ComposeRequest {
            sources: vec![MediaSource::from_path("in.mp4")],
            audio: vec![AudioTrack::from_path("track.mp3")],
            output: OutputSpec::new("out.mp4"),
            text: TextLayout::None,
            text_background: true,
            logo: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(minimal_request().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut req = minimal_request();
        req.sources.clear();
        assert_eq!(req.validate(), Err(ValidationError::NoVisualSource));

        let mut req = minimal_request();
        req.audio.clear();
        assert_eq!(req.validate(), Err(ValidationError::NoAudioTrack));

        let mut req = minimal_request();
        req.output.path = "".into();
        assert_eq!(req.validate(), Err(ValidationError::NoOutputPath));
    }

    #[test]
    fn test_stack_lines_skip_blank_but_keep_slots() {
        let layout = TextLayout::CenteredStack {
            title: Some(TextLine::new("Title", 64)),
            subtitle: Some(TextLine::new("   ", 48)),
            tagline: Some(TextLine::new("Tagline", 36)),
        };
        let lines = layout.stack_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 0);
        assert_eq!(lines[0].1.text, "Title");
        assert_eq!(lines[1].0, 2);
        assert_eq!(lines[1].1.text, "Tagline");
    }

    #[test]
    fn test_tagline_only_keeps_its_slot() {
        let layout = TextLayout::CenteredStack {
            title: None,
            subtitle: None,
            tagline: Some(TextLine::new("Tagline", 36)),
        };
        let lines = layout.stack_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, 2);
    }

    #[test]
    fn test_validate_rejects_zero_font_size() {
        let mut req = minimal_request();
        req.text = TextLayout::CenteredStack {
            title: Some(TextLine::new("Title", 0)),
            subtitle: None,
            tagline: None,
        };
        assert_eq!(req.validate(), Err(ValidationError::ZeroFontSize));

        let mut req = minimal_request();
        req.text = TextLayout::Corner(SimpleOverlay {
            text: "credit".to_string(),
            font_size: 0,
            anchor: Anchor::BottomRight,
        });
        assert_eq!(req.validate(), Err(ValidationError::ZeroFontSize));

        // A blank line never renders, so its size is irrelevant.
        let mut req = minimal_request();
        req.text = TextLayout::CenteredStack {
            title: Some(TextLine::new("Title", 64)),
            subtitle: Some(TextLine::new("   ", 0)),
            tagline: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_corner_layout_has_no_stack_lines() {
        let layout = TextLayout::Corner(SimpleOverlay {
            text: "watermark".to_string(),
            font_size: 48,
            anchor: Anchor::BottomRight,
        });
        assert!(layout.stack_lines().is_empty());
        assert!(!layout.is_centered());
    }
}
