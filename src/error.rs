use sea_orm::DbErr;
use thiserror::Error;

pub type EtlResult<T> = Result<T, EtlError>;

/// Failure talking to the NEO feed. Fatal to the window being fetched.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        EtlError::Fetch(FetchError::Transport(err))
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Parse(err.to_string())
    }
}
