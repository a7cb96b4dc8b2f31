use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use re_crypto::KeyStore;
use re_ledger::AuditLedger;
use re_records::{Clock, IdSource, LedgerEntry, RandomIdSource, SystemClock};
use re_store::OpenMode;

use crate::error::CliFailure;
use crate::io_util::{write_json_pretty, write_jsonl};
use crate::record_kind::parse_record_kind;

#[derive(Subcommand)]
pub enum LedgerCommand {
    /// Sign and append one entry to the ledger.
    Append {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        #[arg(long)]
        signing_key_id: String,
        #[arg(long)]
        record_kind: String,
        #[arg(long)]
        record_ref: String,
    },
    /// Verify seq monotonicity, chain linkage, and signatures.
    Verify {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        keys: PathBuf,
    },
    /// Export every entry, one JSON object per line, sealed into a signed
    /// report alongside it.
    Export {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        #[arg(long)]
        signing_key_id: String,
    },
}

pub fn run(cmd: LedgerCommand) -> anyhow::Result<()> {
    match cmd {
        LedgerCommand::Append {
            ledger,
            keys,
            signing_key_id,
            record_kind,
            record_ref,
        } => append(&ledger, &keys, &signing_key_id, &record_kind, &record_ref),
        LedgerCommand::Verify { ledger, keys } => verify(&ledger, &keys),
        LedgerCommand::Export {
            ledger,
            out,
            keys,
            signing_key_id,
        } => export(&ledger, &out, &keys, &signing_key_id),
    }
}

fn append(
    ledger_path: &PathBuf,
    keys_dir: &PathBuf,
    signing_key_id: &str,
    record_kind: &str,
    record_ref: &str,
) -> anyhow::Result<()> {
    let kind = parse_record_kind(record_kind)?;
    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let signing_key = keystore
        .load_private(signing_key_id)
        .map_err(|e| CliFailure::MissingInput(format!("loading private key {signing_key_id}: {e}")))?;

    let mut ledger = AuditLedger::open(ledger_path, OpenMode::ReadWrite)
        .map_err(|e| CliFailure::Io(format!("opening ledger {}: {e}", ledger_path.display())))?;
    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let entry_id = ids.next_id().to_string();

    let entry = ledger
        .append_entry(kind, record_ref.to_string(), &signing_key, signing_key_id.to_string(), entry_id, &clock)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("appending ledger entry")?;

    println!("appended ledger entry seq {} id {}", entry.seq, entry.entry_id);
    Ok(())
}

fn verify(ledger_path: &PathBuf, keys_dir: &PathBuf) -> anyhow::Result<()> {
    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let ledger = AuditLedger::open(ledger_path, OpenMode::ReadOnly)
        .map_err(|e| CliFailure::Io(format!("opening ledger {}: {e}", ledger_path.display())))?;

    ledger
        .verify_chain(&keystore)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("verifying ledger chain")?;

    println!("ledger chain verifies");
    Ok(())
}

fn export(ledger_path: &PathBuf, out: &PathBuf, keys_dir: &PathBuf, signing_key_id: &str) -> anyhow::Result<()> {
    let ledger = AuditLedger::open(ledger_path, OpenMode::ReadOnly)
        .map_err(|e| CliFailure::Io(format!("opening ledger {}: {e}", ledger_path.display())))?;
    let (entries, recovery): (Vec<LedgerEntry>, _) = ledger
        .read_all()
        .map_err(|e| CliFailure::Io(format!("reading ledger {}: {e}", ledger_path.display())))?;

    if recovery.truncated {
        tracing::warn!(discarded_bytes = recovery.discarded_bytes, "trailing partial ledger line discarded on export");
    }
    write_jsonl(out, &entries)?;

    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let signing_key = keystore
        .load_private(signing_key_id)
        .map_err(|e| CliFailure::MissingInput(format!("loading private key {signing_key_id}: {e}")))?;
    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let signed_report = re_replay::seal_ledger_export(
        out,
        &signing_key,
        signing_key_id.to_string(),
        ids.next_id().to_string(),
        clock.now_rfc3339(),
    )
    .map_err(|e| CliFailure::Domain(e.to_string()))
    .context("sealing ledger export")?;
    let report_path = sibling_report_path(out);
    write_json_pretty(&report_path, &signed_report)?;

    println!("exported {} entries, signed report at {}", entries.len(), report_path.display());
    Ok(())
}

fn sibling_report_path(out: &PathBuf) -> PathBuf {
    let mut file_name = out.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    file_name.push(".signed-report.json");
    out.with_file_name(file_name)
}
