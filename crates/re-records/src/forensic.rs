//! ForensicArtifact record: `spec.md` §3. Content-addressed by SHA-256 of
//! file bytes; compression deterministic gzip with mtime/filename stripped.
//! Grounded on `killchain-forensics/evidence/hasher.py` and `compressor.py`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::factory::{Clock, IdSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForensicArtifact {
    pub artifact_id: String,
    pub incident_id: String,
    pub original_filename: String,
    pub content_hash: String,
    pub compressed_hash: String,
    pub size_bytes: u64,
    pub collected_at: String,
    pub collected_by: String,
}

impl ForensicArtifact {
    /// Seal a collected file as a forensic artifact: hash the original bytes,
    /// gzip them deterministically to `compressed_out_path`, and hash the
    /// compressed result. `size_bytes` is the original file's size, matching
    /// `original_filename` and `content_hash`.
    pub fn new(
        incident_id: impl Into<String>,
        source_path: &Path,
        compressed_out_path: &Path,
        collected_by: impl Into<String>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<Self> {
        let incident_id = incident_id.into();
        if incident_id.is_empty() {
            return Err(RecordError::MissingField { field: "incident_id" });
        }
        let original_filename = source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .ok_or(RecordError::MissingField {
                field: "original_filename",
            })?;

        let content_hash = re_canon::sha256_of_path(source_path)?;
        let (compressed_hash, _compressed_size_bytes) =
            re_canon::gzip_file_deterministic(source_path, compressed_out_path)?;
        let size_bytes = std::fs::metadata(source_path)
            .map_err(|source| {
                re_canon::FileHashError::Io {
                    path: source_path.to_path_buf(),
                    source,
                }
            })?
            .len();

        Ok(ForensicArtifact {
            artifact_id: ids.next_id().to_string(),
            incident_id,
            original_filename,
            content_hash,
            compressed_hash,
            size_bytes,
            collected_at: clock.now_rfc3339(),
            collected_by: collected_by.into(),
        })
    }
}
