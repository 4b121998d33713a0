use std::path::PathBuf;

use thiserror::Error;

/// The single error type crossing module boundaries in the playback core.
///
/// Mirrors the kind tags the original C source encoded as negative return
/// values plus a global message slot (see DESIGN.md); here each kind carries
/// its own context instead of mutating shared state.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(String),

    /// Not a real error: signals that gapless chaining is not possible and
    /// a device tear-down/reinit is required instead.
    #[error("format mismatch, gapless chaining unavailable: {0}")]
    FormatMismatch(String),

    #[error("device error: {0}")]
    Device(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A switch is in flight and preempted the requested operation.
    #[error("cancelled: a decoder switch is in progress")]
    Cancelled,
}

impl PlaybackError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for errors that should mark a song as errored and trigger a
    /// forced skip, rather than abort playback entirely.
    pub fn is_song_local(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
