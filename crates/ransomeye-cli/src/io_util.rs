//! Small file-read/write helpers shared by every subcommand. Centralizing
//! these keeps the exit-code contract (missing input vs. I/O failure)
//! consistent instead of re-deriving it at each call site.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CliFailure;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CliFailure::MissingInput(format!("{} not found", path.display()))
        } else {
            CliFailure::Io(format!("reading {}: {e}", path.display()))
        }
    })?;
    serde_json::from_str(&text)
        .with_context(|| CliFailure::MissingInput(format!("{} is not valid JSON for the expected shape", path.display())))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    fs::write(path, text).map_err(|e| CliFailure::Io(format!("writing {}: {e}", path.display())).into())
}

pub fn write_jsonl<T: Serialize>(path: &Path, values: &[T]) -> anyhow::Result<()> {
    let mut out = String::new();
    for value in values {
        out.push_str(&serde_json::to_string(value).context("serializing output")?);
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| CliFailure::Io(format!("writing {}: {e}", path.display())).into())
}
