use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid loan input: {0}")]
    InvalidInput(String),

    #[error("Amount '{0}' is not a number")]
    InvalidAmount(String),

    #[error("Row {row} is out of range (schedule has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Malformed schedule file {}: {reason}", .path.display())]
    MalformedSchedule { path: PathBuf, reason: String },

    #[error("Access key does not unlock editing")]
    AccessDenied,

    #[error("Live translation failed: {0}")]
    Translation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[cfg(feature = "live-translate")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
