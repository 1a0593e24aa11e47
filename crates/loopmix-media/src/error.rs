//! Error types for the composition pipeline.

use thiserror::Error;

pub use loopmix_models::ValidationError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while composing.
///
/// Probe failures are deliberately absent: the prober recovers them locally
/// as a zero duration and never surfaces them to the caller.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Failed to spawn {stage}: {message}")]
    SpawnFailed { stage: String, message: String },

    #[error("{stage} exited with code {code}")]
    ExitStatus { stage: String, code: i32 },

    #[error("{stage} terminated by signal")]
    Terminated { stage: String },

    #[error("Incompatible encoder options: {0}")]
    IncompatibleOptions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a spawn failure error for a named pipeline stage.
    pub fn spawn_failed(stage: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            stage: stage.into(),
            message: source.to_string(),
        }
    }

    /// Create an exit-status error for a named pipeline stage.
    pub fn exit_status(stage: impl Into<String>, code: Option<i32>) -> Self {
        match code {
            Some(code) => Self::ExitStatus {
                stage: stage.into(),
                code,
            },
            None => Self::Terminated {
                stage: stage.into(),
            },
        }
    }
}
