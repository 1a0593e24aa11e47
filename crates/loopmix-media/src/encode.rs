//! Encoding profile selection.
//!
//! Pure lookup from (container, quality tier) to concrete encoder
//! parameters. Three codec families: ProRes in MOV, high-quality H.264 in
//! MOV, and standard H.264 in MP4.

use loopmix_models::{Container, QualityTier};

use crate::command::FfmpegCommand;

/// Concrete encoder parameters for the final encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingProfile {
    /// Video codec name
    pub codec: &'static str,
    /// CRF quality (H.264 families)
    pub crf: Option<u8>,
    /// ProRes profile index (MOV/ProRes family)
    pub prores_profile: Option<u8>,
    /// Video bitrate cap (H.264 families)
    pub video_bitrate: Option<&'static str>,
    /// Output pixel format
    pub pixel_format: &'static str,
    /// Encoder preset (H.264 families)
    pub preset: Option<&'static str>,
    /// Relocate metadata for progressive playback
    pub faststart: bool,
}

impl EncodingProfile {
    /// Select the profile for a container and quality tier.
    ///
    /// `None` (missing or unrecognized tier) falls back to `VeryHigh` for
    /// the H.264 families and to the highest ProRes profile.
    pub fn select(container: Container, tier: Option<QualityTier>) -> Self {
        match container {
            Container::Mov => Self::prores(tier),
            Container::MovH264 => Self::h264_mov(tier.unwrap_or(QualityTier::VeryHigh)),
            Container::Mp4 => Self::h264_mp4(tier.unwrap_or(QualityTier::VeryHigh)),
        }
    }

    fn prores(tier: Option<QualityTier>) -> Self {
        // Profile index rises with the tier: proxy, LT, standard, HQ.
        let profile = match tier {
            Some(QualityTier::Medium) => 0,
            Some(QualityTier::High) => 1,
            Some(QualityTier::VeryHigh) => 2,
            Some(QualityTier::Ultra) | None => 3,
        };
        Self {
            codec: "prores_ks",
            crf: None,
            prores_profile: Some(profile),
            video_bitrate: None,
            pixel_format: "yuv422p10le",
            preset: None,
            faststart: false,
        }
    }

    fn h264_mov(tier: QualityTier) -> Self {
        let (crf, bitrate) = match tier {
            QualityTier::Medium => (20, "8M"),
            QualityTier::High => (18, "12M"),
            QualityTier::VeryHigh => (16, "20M"),
            QualityTier::Ultra => (14, "40M"),
        };
        Self {
            codec: "libx264",
            crf: Some(crf),
            prores_profile: None,
            video_bitrate: Some(bitrate),
            pixel_format: "yuv420p",
            preset: Some("slow"),
            faststart: true,
        }
    }

    fn h264_mp4(tier: QualityTier) -> Self {
        let (crf, bitrate) = match tier {
            QualityTier::Medium => (23, "4M"),
            QualityTier::High => (21, "6M"),
            QualityTier::VeryHigh => (19, "10M"),
            QualityTier::Ultra => (17, "16M"),
        };
        Self {
            codec: "libx264",
            crf: Some(crf),
            prores_profile: None,
            video_bitrate: Some(bitrate),
            pixel_format: "yuv420p",
            preset: Some("medium"),
            faststart: true,
        }
    }

    /// Apply the profile's video parameters to a command.
    pub fn apply_to(&self, mut cmd: FfmpegCommand) -> FfmpegCommand {
        cmd = cmd.video_codec(self.codec).pixel_format(self.pixel_format);
        if let Some(profile) = self.prores_profile {
            cmd = cmd.prores_profile(profile);
        }
        if let Some(crf) = self.crf {
            cmd = cmd.crf(crf);
        }
        if let Some(bitrate) = self.video_bitrate {
            cmd = cmd.video_bitrate(bitrate);
        }
        if let Some(preset) = self.preset {
            cmd = cmd.preset(preset);
        }
        if self.faststart {
            cmd = cmd.faststart();
        }
        cmd
    }
}
