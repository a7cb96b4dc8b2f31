#[derive(Debug, thiserror::Error)]
pub enum UbaError {
    #[error("window end {end} is not after window start {start}")]
    InvalidWindow { start: String, end: String },
    #[error("cannot normalize risk from an empty component set")]
    EmptyComponents,
    #[error(transparent)]
    Record(#[from] re_records::RecordError),
    #[error(transparent)]
    Canon(#[from] re_canon::CanonError),
    #[error(transparent)]
    Store(#[from] re_store::StoreError),
}

pub type Result<T> = std::result::Result<T, UbaError>;
