//! Deterministic chunked file hashing.
//!
//! Grounded on `killchain-forensics/evidence/hasher.py`: SHA-256 over a file
//! read in fixed-size chunks, required to be byte-identical to hashing the
//! whole file at once.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::{Compression, GzBuilder};
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum FileHashError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// SHA-256 of a file's contents, hex-encoded, reading in `chunk_size`-byte
/// chunks. Deterministic regardless of chunk size.
pub fn sha256_of_file(path: &Path, chunk_size: usize) -> Result<String, FileHashError> {
    if !path.exists() {
        return Err(FileHashError::NotFound(path.to_path_buf()));
    }
    let mut file = File::open(path).map_err(|source| FileHashError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = file.read(&mut buf).map_err(|source| FileHashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Verify that `path` hashes to `expected_hash`, failing closed on mismatch.
pub fn verify_file_hash(path: &Path, expected_hash: &str) -> Result<bool, FileHashError> {
    let actual = sha256_of_file(path, 4096)?;
    Ok(actual == expected_hash)
}

/// Gzip `bytes` with the mtime zeroed and no embedded filename, so the same
/// input always produces the same compressed output byte-for-byte.
/// Grounded on `killchain-forensics/evidence/compressor.py`'s
/// `compress_deterministic`.
pub fn gzip_deterministic(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzBuilder::new().mtime(0).write(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .expect("writing to an in-memory buffer cannot fail");
    encoder.finish().expect("finishing an in-memory gzip stream cannot fail")
}

/// Read `path`, gzip it deterministically, and write the result to
/// `out_path`. Returns the SHA-256 of the compressed bytes and their length.
pub fn gzip_file_deterministic(path: &Path, out_path: &Path) -> Result<(String, u64), FileHashError> {
    if !path.exists() {
        return Err(FileHashError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| FileHashError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let compressed = gzip_deterministic(&bytes);
    std::fs::write(out_path, &compressed).map_err(|source| FileHashError::Io {
        path: out_path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    Ok((hex::encode(hasher.finalize()), compressed.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn chunked_hash_matches_whole_file_hash() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data = vec![7u8; 10_000];
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let small_chunks = sha256_of_file(file.path(), 17).unwrap();
        let one_chunk = sha256_of_file(file.path(), 1 << 20).unwrap();
        assert_eq!(small_chunks, one_chunk);
    }

    #[test]
    fn missing_file_errors() {
        let err = sha256_of_file(Path::new("/nonexistent/does-not-exist"), 4096).unwrap_err();
        assert!(matches!(err, FileHashError::NotFound(_)));
    }

    #[test]
    fn verify_detects_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();
        assert!(!verify_file_hash(file.path(), "deadbeef").unwrap());
    }

    #[test]
    fn gzip_deterministic_is_reproducible() {
        let first = gzip_deterministic(b"same bytes every time");
        let second = gzip_deterministic(b"same bytes every time");
        assert_eq!(first, second);
    }

    #[test]
    fn gzip_deterministic_output_differs_from_input() {
        let compressed = gzip_deterministic(b"hello world");
        assert_ne!(compressed, b"hello world");
        assert!(compressed.starts_with(&[0x1f, 0x8b]));
    }

    #[test]
    fn gzip_file_deterministic_reproduces_same_hash_on_recompression() {
        let mut src = tempfile::NamedTempFile::new().unwrap();
        src.write_all(b"forensic payload bytes").unwrap();
        src.flush().unwrap();

        let out_a = tempfile::NamedTempFile::new().unwrap();
        let out_b = tempfile::NamedTempFile::new().unwrap();
        let (hash_a, len_a) = gzip_file_deterministic(src.path(), out_a.path()).unwrap();
        let (hash_b, len_b) = gzip_file_deterministic(src.path(), out_b.path()).unwrap();

        assert_eq!(hash_a, hash_b);
        assert_eq!(len_a, len_b);
    }
}
