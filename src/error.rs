use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to open channel for {market}: {reason}")]
    ChannelOpen { market: String, reason: String },
    #[error("remote source unavailable: no channel could be opened ({0})")]
    SourceUnavailable(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    pub fn channel_open<M: Into<String>, R: Into<String>>(market: M, reason: R) -> Self {
        AppError::ChannelOpen {
            market: market.into(),
            reason: reason.into(),
        }
    }
}
