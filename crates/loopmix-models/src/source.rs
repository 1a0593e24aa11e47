//! Visual and audio source definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions treated as still images. Everything else is a video.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

/// Kind of a visual source, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Moving picture source (mp4, mov, mkv, ...)
    Video,
    /// Still image source (png, jpg, ...)
    Image,
}

impl SourceKind {
    /// Infer the kind from a file path's extension.
    ///
    /// Unknown or missing extensions are treated as video, so an exotic
    /// container still flows through the video path rather than being
    /// rejected up front.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => SourceKind::Image,
            _ => SourceKind::Video,
        }
    }

    /// Whether this kind is a still image.
    pub fn is_image(&self) -> bool {
        matches!(self, SourceKind::Image)
    }
}

/// One visual input. Order within a request is playback order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MediaSource {
    /// Path to the source file
    pub path: PathBuf,
    /// Video or image, inferred from the extension
    pub kind: SourceKind,
}

impl MediaSource {
    /// Create a source, inferring the kind from the path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = SourceKind::from_path(&path);
        Self { path, kind }
    }

    /// Whether this source is a still image.
    pub fn is_image(&self) -> bool {
        self.kind.is_image()
    }
}

/// One audio input. Tracks are concatenated in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AudioTrack {
    /// Path to the audio file
    pub path: PathBuf,
}

impl AudioTrack {
    /// Create a track from a path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(SourceKind::from_path("clip.mp4"), SourceKind::Video);
        assert_eq!(SourceKind::from_path("clip.MOV"), SourceKind::Video);
        assert_eq!(SourceKind::from_path("still.png"), SourceKind::Image);
        assert_eq!(SourceKind::from_path("still.JPEG"), SourceKind::Image);
        assert_eq!(SourceKind::from_path("photo.webp"), SourceKind::Image);
    }

    #[test]
    fn test_unknown_extension_is_video() {
        assert_eq!(SourceKind::from_path("mystery.xyz"), SourceKind::Video);
        assert_eq!(SourceKind::from_path("no_extension"), SourceKind::Video);
    }

    #[test]
    fn test_media_source_from_path() {
        let source = MediaSource::from_path("/media/intro.jpg");
        assert!(source.is_image());

        let source = MediaSource::from_path("/media/intro.mkv");
        assert!(!source.is_image());
    }
}
