#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Ledger(#[from] re_ledger::LedgerError),
    #[error(transparent)]
    KeyStore(#[from] re_crypto::KeyStoreError),
    #[error(transparent)]
    Record(#[from] re_records::RecordError),
    #[error(transparent)]
    Canon(#[from] re_canon::CanonError),
    #[error(transparent)]
    FileHash(#[from] re_canon::FileHashError),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
