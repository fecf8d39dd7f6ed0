use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontierError {
    #[error("invalid pattern in configuration: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("unknown URL record index: {0}")]
    UnknownRecord(usize),
}

pub type Result<T> = std::result::Result<T, FrontierError>;
