#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] re_store::StoreError),
    #[error(transparent)]
    Record(#[from] re_records::RecordError),
    #[error(transparent)]
    KeyStore(#[from] re_crypto::KeyStoreError),
    #[error("ledger chain broken at seq {seq}: {reason}")]
    ChainBroken { seq: u64, reason: String },
    #[error("expected seq {expected}, got {actual}")]
    SeqMismatch { expected: u64, actual: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
