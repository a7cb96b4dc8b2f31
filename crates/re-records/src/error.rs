//! Input-rejected errors for record construction (`spec.md` §7.1): malformed
//! record, missing required field, unknown enum value. Every `RecordFactory`
//! constructor fails before any state change on these variants.

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("required field '{field}' is empty")]
    MissingField { field: &'static str },
    #[error("invalid value for '{field}': {value}")]
    InvalidEnumValue { field: &'static str, value: String },
    #[error("{0} must be in [{1}, {2}], got {3}")]
    OutOfRange(&'static str, f64, f64, f64),
    #[error("canonicalization failed: {0}")]
    Canon(#[from] re_canon::CanonError),
    #[error("referential invariant violated: {0}")]
    Referential(String),
    #[error("artifact file operation failed: {0}")]
    ArtifactFile(#[from] re_canon::FileHashError),
}

pub type Result<T> = std::result::Result<T, RecordError>;
