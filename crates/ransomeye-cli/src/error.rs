//! CLI-boundary error classification: `spec.md` §6 exit codes. Every
//! subcommand handler returns `anyhow::Result<()>`; this is the one type
//! that carries enough shape for `main` to pick an exit code out of an
//! otherwise-opaque `anyhow::Error` chain.

#[derive(Debug, thiserror::Error)]
pub enum CliFailure {
    /// Verification, validation, or policy rejection — `spec.md` §6 exit 1.
    #[error("{0}")]
    Domain(String),
    /// A required file/flag was absent or unreadable as the expected shape
    /// — `spec.md` §6 exit 2.
    #[error("missing input: {0}")]
    MissingInput(String),
    /// Read/write/fsync error against a store, key, or report file —
    /// `spec.md` §6 exit 3.
    #[error("I/O failure: {0}")]
    Io(String),
}

impl CliFailure {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliFailure::Domain(_) => 1,
            CliFailure::MissingInput(_) => 2,
            CliFailure::Io(_) => 3,
        }
    }
}

/// Walk an `anyhow::Error`'s cause chain for a `CliFailure`, defaulting to
/// exit code 1 (domain failure) for anything that never got classified.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CliFailure>())
        .map(CliFailure::exit_code)
        .unwrap_or(1)
}
