use std::path::PathBuf;

use crate::document::CollectionKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("segment encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("index metadata error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index at {} is locked by another writer", path.display())]
    WriterLocked { path: PathBuf },

    #[error("index at {} is already committed; rebuild requires removing it", path.display())]
    IndexExists { path: PathBuf },

    #[error("index root {} does not name a directory", path.display())]
    InvalidRoot { path: PathBuf },

    #[error("{} is not a committed index and is not empty; refusing to replace it", path.display())]
    RootNotEmpty { path: PathBuf },

    #[error("no committed index at {}", path.display())]
    IndexNotFound { path: PathBuf },

    #[error("index holds {found} documents, expected {expected}")]
    CollectionMismatch {
        expected: CollectionKind,
        found: CollectionKind,
    },

    #[error("unsupported index format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error(
        "invalid bounding box lat [{lat_min}, {lat_max}] lon [{lon_min}, {lon_max}]: {reason}"
    )]
    InvalidBounds {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
        reason: &'static str,
    },

    #[error("review {review_id} has unparseable date {value:?}")]
    DateParse { review_id: String, value: String },

    #[error("configuration error: {0}")]
    Config(String),
}
