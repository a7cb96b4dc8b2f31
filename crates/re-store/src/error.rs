use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store '{0}' is open read-only")]
    ReadOnly(PathBuf),
    #[error("could not acquire exclusive write lock on '{0}' (another writer holds it)")]
    LockContended(PathBuf),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store contains non-UTF-8 bytes: '{0}'")]
    NotUtf8(PathBuf),
    #[error("malformed record at line {line} of '{path}': {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("canonicalization failed: {0}")]
    Canon(#[from] re_canon::CanonError),
    #[error("range [{start}, {end}) out of bounds for store of {len} records")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
