//! Durable append-only JSONL store: `spec.md` §4.6. Grounded on
//! `risk-index/storage/risk_store.py` (`open(..., 'a')` + `flush` +
//! `os.fsync`) for the append/fsync sequence, and the single-writer
//! exclusive-lock requirement in `spec.md` §9 ("Filesystem as database...
//! enforced by an OS-level exclusive lock").
//!
//! Resolves the open question in `spec.md` §9 ("partial lines on crash") in
//! favor of the stricter choice: a torn trailing line is surfaced in a
//! [`RecoveryReport`] on every read, and is physically truncated from disk
//! the moment a writer reopens the store (`spec.md` §97, §165: "reader
//! truncates at last newline... keeps file valid for future appends") so a
//! subsequent append can never fuse with leftover garbage bytes. A read-only
//! open never mutates the file — it holds no lock, so truncating while a
//! writer might be mid-append would race.

pub mod error;

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadWrite,
    ReadOnly,
}

/// What `read_all` found on the store's trailing bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub valid_records: usize,
    pub truncated: bool,
    pub discarded_bytes: usize,
}

/// A durable, single-writer, multi-reader JSONL store. One line is one
/// record's canonical JSON encoding (`spec.md` §6: "All stores are JSONL").
pub struct AppendOnlyStore {
    path: PathBuf,
    file: File,
    read_only: bool,
}

impl AppendOnlyStore {
    /// Open (creating if absent, in read-write mode) the store at `path`.
    /// A read-write open takes an OS-level exclusive lock for the lifetime
    /// of the returned handle; a read-only open takes no lock at all
    /// (`spec.md` §5: "readers take no lock").
    pub fn open(path: impl Into<PathBuf>, mode: OpenMode) -> Result<Self> {
        let path = path.into();
        let read_only = matches!(mode, OpenMode::ReadOnly);

        let file = OpenOptions::new()
            .create(!read_only)
            .read(true)
            .append(!read_only)
            .open(&path)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        if !read_only {
            file.try_lock_exclusive()
                .map_err(|_| StoreError::LockContended(path.clone()))?;
            Self::truncate_partial_tail(&file, &path)?;
        }

        Ok(Self {
            path,
            file,
            read_only,
        })
    }

    /// Physically cut a torn trailing line (left by a crash mid-write) off
    /// the file, so it ends on a newline and an `.append(true)` write lands
    /// cleanly after the last complete record. Only the writer that just
    /// took the exclusive lock calls this — never a lock-less reader.
    fn truncate_partial_tail(file: &File, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.is_empty() || bytes.ends_with(b"\n") {
            return Ok(());
        }
        let keep = match bytes.iter().rposition(|&b| b == b'\n') {
            Some(idx) => idx + 1,
            None => 0,
        };
        file.set_len(keep as u64).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Append `record`'s canonical JSON as one line, flush, and `fsync`
    /// before returning (`spec.md` §4.6 guarantee (a): "a successful append
    /// is durable across process crash").
    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly(self.path.clone()));
        }
        let mut line = re_canon::canonical_bytes(record, &BTreeSet::new())?;
        line.push(b'\n');
        self.file.write_all(&line).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.file.flush().map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.file.sync_all().map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Read every complete, newline-terminated record in file order. A
    /// trailing partial line (possible after a crash mid-write) is skipped
    /// and reported, never parsed. This call itself never mutates the file —
    /// on a read-write handle the tail was already truncated at `open`.
    pub fn read_all<T: DeserializeOwned>(&self) -> Result<(Vec<T>, RecoveryReport)> {
        let bytes = std::fs::read(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes)
            .map_err(|_| StoreError::NotUtf8(self.path.clone()))?;

        let mut report = RecoveryReport::default();
        let mut lines: Vec<&str> = text.split('\n').collect();

        if text.ends_with('\n') {
            lines.pop(); // the empty string after the final newline
        } else if let Some(last) = lines.pop() {
            if !last.is_empty() {
                report.truncated = true;
                report.discarded_bytes = last.len();
            }
        }

        let mut records = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(line).map_err(|source| StoreError::MalformedRecord {
                path: self.path.clone(),
                line: idx,
                source,
            })?;
            records.push(record);
            report.valid_records += 1;
        }
        Ok((records, report))
    }

    /// Number of complete, newline-terminated lines — ignores any partial
    /// trailing line, matching `spec.md` §7.4: "no partial record is
    /// visible".
    pub fn count(&self) -> Result<usize> {
        let bytes = std::fs::read(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(bytes.iter().filter(|&&b| b == b'\n').count())
    }

    /// Records `[start, end)` in file order.
    pub fn range<T: DeserializeOwned>(&self, start: usize, end: usize) -> Result<Vec<T>> {
        let (records, _) = self.read_all::<T>()?;
        if start > end || end > records.len() {
            return Err(StoreError::RangeOutOfBounds {
                start,
                end,
                len: records.len(),
            });
        }
        Ok(records[start..end].to_vec())
    }
}
