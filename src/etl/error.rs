use crate::warehouse::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// A source document could not be turned into rows.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} contains no records")]
    Empty { path: PathBuf },

    #[error("Malformed record in {path:?} at line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field `{field}` in {path:?} at line {line}")]
    MissingField {
        path: PathBuf,
        line: usize,
        field: &'static str,
    },

    #[error("Invalid value {value:?} for `{field}` in {path:?} at line {line}")]
    InvalidField {
        path: PathBuf,
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Any failure that halts a batch.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to discover files under {root:?}: {source}")]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
