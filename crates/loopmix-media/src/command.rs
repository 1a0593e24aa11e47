//! Typed FFmpeg argument builder.
//!
//! Flags are collected by semantic option rather than by string pasting, so
//! incompatible combinations (a ProRes profile next to a CRF or video
//! bitrate) are rejected before anything is spawned.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// One input file plus the flags that precede its `-i`.
#[derive(Debug, Clone)]
struct Input {
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for one FFmpeg invocation.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    filter_complex: Option<String>,
    maps: Vec<String>,
    video_codec: Option<String>,
    crf: Option<u8>,
    prores_profile: Option<u8>,
    video_bitrate: Option<String>,
    pixel_format: Option<String>,
    preset: Option<String>,
    audio_codec: Option<String>,
    audio_bitrate: Option<String>,
    duration: Option<f64>,
    shortest: bool,
    faststart: bool,
    no_audio: bool,
}

impl FfmpegCommand {
    /// Create a command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Add a plain input file.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args::<&str>(&[], path)
    }

    /// Add an input read through the concat demuxer (a manifest file).
    pub fn concat_input(self, manifest: impl AsRef<Path>) -> Self {
        self.input_with_args(&["-f", "concat", "-safe", "0"], manifest)
    }

    /// Add a still image looped as a constant stream of frames.
    pub fn looped_image_input(self, path: impl AsRef<Path>, framerate: u32) -> Self {
        self.input_with_args(
            &["-loop", "1", "-framerate", &framerate.to_string()],
            path,
        )
    }

    /// Add a finite video input looped indefinitely.
    pub fn looped_video_input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(&["-stream_loop", "-1"], path)
    }

    /// Add an input with arbitrary flags preceding its `-i`.
    pub fn input_with_args<S: AsRef<str>>(mut self, args: &[S], path: impl AsRef<Path>) -> Self {
        self.inputs.push(Input {
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// Set the filter-complex expression.
    pub fn with_filter_graph(mut self, filter: impl Into<String>) -> Self {
        self.filter_complex = Some(filter.into());
        self
    }

    /// Map a stream specifier or filter label into the output.
    pub fn map(mut self, spec: impl Into<String>) -> Self {
        self.maps.push(spec.into());
        self
    }

    /// Set the video codec.
    pub fn video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = Some(codec.into());
        self
    }

    /// Set CRF quality.
    pub fn crf(mut self, crf: u8) -> Self {
        self.crf = Some(crf);
        self
    }

    /// Set the ProRes profile index.
    pub fn prores_profile(mut self, profile: u8) -> Self {
        self.prores_profile = Some(profile);
        self
    }

    /// Set the video bitrate (e.g. "10M").
    pub fn video_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.video_bitrate = Some(bitrate.into());
        self
    }

    /// Set the output pixel format.
    pub fn pixel_format(mut self, format: impl Into<String>) -> Self {
        self.pixel_format = Some(format.into());
        self
    }

    /// Set the encoder preset.
    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// Set the audio codec.
    pub fn audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = Some(codec.into());
        self
    }

    /// Set the audio bitrate (e.g. "192k").
    pub fn audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = Some(bitrate.into());
        self
    }

    /// Limit the output duration in seconds.
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Stop at the end of the shortest mapped stream.
    pub fn shortest(mut self) -> Self {
        self.shortest = true;
        self
    }

    /// Relocate metadata for progressive playback (`-movflags +faststart`).
    pub fn faststart(mut self) -> Self {
        self.faststart = true;
        self
    }

    /// Drop all audio streams.
    pub fn no_audio(mut self) -> Self {
        self.no_audio = true;
        self
    }

    /// The output path this command writes to.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Serialize to the argument vector, validating option compatibility.
    pub fn build_args(&self) -> MediaResult<Vec<String>> {
        if self.prores_profile.is_some() && (self.crf.is_some() || self.video_bitrate.is_some()) {
            return Err(MediaError::IncompatibleOptions(
                "a ProRes profile cannot be combined with CRF or a video bitrate".to_string(),
            ));
        }

        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        if let Some(filter) = &self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(filter.clone());
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        if self.shortest {
            args.push("-shortest".to_string());
        }

        if let Some(codec) = &self.video_codec {
            args.push("-c:v".to_string());
            args.push(codec.clone());
        }
        if let Some(profile) = self.prores_profile {
            args.push("-profile:v".to_string());
            args.push(profile.to_string());
        }
        if let Some(crf) = self.crf {
            args.push("-crf".to_string());
            args.push(crf.to_string());
        }
        if let Some(bitrate) = &self.video_bitrate {
            args.push("-b:v".to_string());
            args.push(bitrate.clone());
        }
        if let Some(preset) = &self.preset {
            args.push("-preset".to_string());
            args.push(preset.clone());
        }
        if let Some(format) = &self.pixel_format {
            args.push("-pix_fmt".to_string());
            args.push(format.clone());
        }

        if self.no_audio {
            args.push("-an".to_string());
        } else {
            if let Some(codec) = &self.audio_codec {
                args.push("-c:a".to_string());
                args.push(codec.clone());
            }
            if let Some(bitrate) = &self.audio_bitrate {
                args.push("-b:a".to_string());
                args.push(bitrate.clone());
            }
        }

        if let Some(seconds) = self.duration {
            args.push("-t".to_string());
            args.push(format!("{seconds:.3}"));
        }

        if self.faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }

        args.push(self.output.to_string_lossy().to_string());
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_command() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("in.mp4")
            .video_codec("libx264")
            .crf(18)
            .preset("fast");

        let args = cmd.build_args().unwrap();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-i".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"18".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_input_args_precede_their_input() {
        let cmd = FfmpegCommand::new("out.mp4")
            .looped_video_input("loop.mp4")
            .input("audio.m4a");

        let args = cmd.build_args().unwrap();
        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        let first_i = args.iter().position(|a| a == "-i").unwrap();
        assert!(loop_pos < first_i);
        assert_eq!(args[loop_pos + 1], "-1");
    }

    #[test]
    fn test_concat_input() {
        let cmd = FfmpegCommand::new("merged.m4a").concat_input("list.txt");
        let args = cmd.build_args().unwrap();
        let f_pos = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f_pos + 1], "concat");
        assert!(args.contains(&"-safe".to_string()));
    }

    #[test]
    fn test_prores_rejects_bitrate() {
        let cmd = FfmpegCommand::new("out.mov")
            .input("in.mp4")
            .video_codec("prores_ks")
            .prores_profile(3)
            .video_bitrate("10M");

        assert!(matches!(
            cmd.build_args(),
            Err(MediaError::IncompatibleOptions(_))
        ));
    }

    #[test]
    fn test_prores_rejects_crf() {
        let cmd = FfmpegCommand::new("out.mov")
            .input("in.mp4")
            .prores_profile(2)
            .crf(18);

        assert!(cmd.build_args().is_err());
    }

    #[test]
    fn test_no_audio_suppresses_audio_flags() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("in.mp4")
            .audio_codec("aac")
            .no_audio();

        let args = cmd.build_args().unwrap();
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
    }

    #[test]
    fn test_shortest_and_faststart() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("in.mp4")
            .shortest()
            .faststart();

        let args = cmd.build_args().unwrap();
        assert!(args.contains(&"-shortest".to_string()));
        let mv = args.iter().position(|a| a == "-movflags").unwrap();
        assert_eq!(args[mv + 1], "+faststart");
    }
}
