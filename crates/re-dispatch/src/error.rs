#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("policy rejection: {reason}")]
    PolicyRejection { reason: String },
    #[error(transparent)]
    Record(#[from] re_records::RecordError),
    #[error(transparent)]
    Canon(#[from] re_canon::CanonError),
    #[error(transparent)]
    Store(#[from] re_store::StoreError),
    #[error(transparent)]
    Ledger(#[from] re_ledger::LedgerError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
