use thiserror::Error;

/// Failures inside the playback layer. None of them leave the controller:
/// they are logged and replaced with degraded data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("failed to fetch {src}: {reason}")]
    Fetch { src: String, reason: String },
    #[error("failed to decode {src}: {reason}")]
    Decode { src: String, reason: String },
    #[error("{0} decoded to an empty buffer")]
    EmptyAudio(String),
    #[error("audio decoding is unavailable: {0}")]
    Unavailable(String),
}

impl PlaybackError {
    pub fn fetch(src: &str, reason: impl ToString) -> Self {
        PlaybackError::Fetch {
            src: src.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(src: &str, reason: impl ToString) -> Self {
        PlaybackError::Decode {
            src: src.to_string(),
            reason: reason.to_string(),
        }
    }
}
