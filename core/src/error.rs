use thiserror::Error;

/// Caller and I/O failures. Gameplay failures (illegal moves, blocked
/// shots, vacant actor slots) are reward penalties and never surface here.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Action index {index} out of range for action space of size {size}")]
    ActionOutOfRange { index: usize, size: usize },

    #[error("step() called before reset()")]
    EpisodeNotStarted,

    #[error("step() called on finished episode {episode}; call reset() first")]
    EpisodeFinished { episode: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
