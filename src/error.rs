//! Error types for the perception pipeline.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PerceptionError>;

/// Boxed error raised by an inference capability.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while processing a frame or building a pipeline.
#[derive(Error, Debug)]
pub enum PerceptionError {
    /// The frame is empty or its buffer does not match its dimensions.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The detection-and-tracking capability failed. Never retried internally.
    #[error("inference backend failed: {0}")]
    InferenceBackend(#[source] BackendError),

    /// A shared pipeline was entered while another frame was in flight.
    #[error("pipeline is already processing a frame")]
    ConcurrentUse,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PerceptionError {
    pub fn invalid_frame<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFrame(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a capability failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InferenceBackend(Box::new(err))
    }

    /// Wrap a capability failure described only by a message.
    pub fn backend_msg<S: Into<String>>(msg: S) -> Self {
        let msg: String = msg.into();
        Self::InferenceBackend(msg.into())
    }
}
