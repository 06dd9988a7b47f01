use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoothError>;

#[derive(Debug, Error)]
pub enum BoothError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("image service request failed: {0}")]
    Transport(String),

    #[error("network request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("malformed image service response: {0}")]
    Decode(String),

    #[error("JSON parse failed: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Other(String),
}

impl BoothError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Network and status failures, as opposed to a body that did not parse.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Reqwest(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::SerdeJson(_))
    }
}

impl From<anyhow::Error> for BoothError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}
