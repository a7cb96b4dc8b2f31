#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy bundle is missing its signature or key id")]
    Unsigned,
    #[error(transparent)]
    Verification(#[from] re_crypto::VerificationError),
    #[error(transparent)]
    KeyStore(#[from] re_crypto::KeyStoreError),
    #[error(transparent)]
    Record(#[from] re_records::RecordError),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
