// errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Network response not ok: {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Feed parsing error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Feed request failed: {0}")]
    Failed(String),
}
