#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    // bad track id, step index out of range, bad config value
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // stop/export with nothing captured; callers treat it as a silent no-op
    #[error("no active recording")]
    NoActiveRecording,

    // fatal at startup
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),
}

pub type Result<T> = std::result::Result<T, SequencerError>;
