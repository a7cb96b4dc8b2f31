use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use re_crypto::KeyStore;
use re_ledger::AuditLedger;
use re_replay::{HashDomainIndex, ValidationStatus, Validator};
use re_store::OpenMode;

use crate::error::CliFailure;
use crate::io_util::{read_json, write_json_pretty};
use crate::record_kind::parse_record_kind;

#[derive(Subcommand)]
pub enum ReplayCommand {
    /// Replay an entire ledger offline: chain integrity, domain-record
    /// presence/integrity, custody, policy config, and routing-decision
    /// reproduction, stopping at the first failure.
    Validate {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        /// JSON array of `{record_kind, stored_hash, matches_now}` entries
        /// describing the domain stores' current state. Omit to run
        /// ledger-only checks (any record_ref will then read as missing).
        #[arg(long)]
        domain_index: Option<PathBuf>,
        #[arg(long)]
        report_id: String,
        #[arg(long)]
        report_signing_key_id: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(serde::Deserialize)]
struct DomainIndexEntry {
    record_kind: String,
    stored_hash: String,
    matches_now: bool,
}

pub fn run(cmd: ReplayCommand) -> anyhow::Result<()> {
    match cmd {
        ReplayCommand::Validate {
            ledger,
            keys,
            domain_index,
            report_id,
            report_signing_key_id,
            out,
        } => validate(&ledger, &keys, domain_index.as_deref(), &report_id, &report_signing_key_id, &out),
    }
}

fn validate(
    ledger_path: &PathBuf,
    keys_dir: &PathBuf,
    domain_index_path: Option<&std::path::Path>,
    report_id: &str,
    report_signing_key_id: &str,
    out: &PathBuf,
) -> anyhow::Result<()> {
    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let ledger = AuditLedger::open(ledger_path, OpenMode::ReadOnly)
        .map_err(|e| CliFailure::Io(format!("opening ledger {}: {e}", ledger_path.display())))?;

    let mut domain_index = HashDomainIndex::new();
    if let Some(path) = domain_index_path {
        let entries: Vec<DomainIndexEntry> = read_json(path)?;
        for entry in entries {
            let kind = parse_record_kind(&entry.record_kind)?;
            domain_index.insert(kind, entry.stored_hash, entry.matches_now);
        }
    }

    let report = Validator::run(&ledger, &keystore, &domain_index, &[], &[], &[])
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("running replay validation")?;

    let signing_key = keystore
        .load_private(report_signing_key_id)
        .map_err(|e| CliFailure::MissingInput(format!("loading private key {report_signing_key_id}: {e}")))?;
    let clock = re_records::SystemClock;
    let signed = re_replay::seal_validation_report(
        &report,
        &signing_key,
        report_signing_key_id.to_string(),
        report_id.to_string(),
        re_records::Clock::now_rfc3339(&clock),
    )
    .map_err(|e| CliFailure::Domain(e.to_string()))
    .context("sealing validation report")?;

    write_json_pretty(out, &signed)?;
    match report.validation_status {
        ValidationStatus::Pass => {
            println!("validation PASS ({} entries checked)", report.entries_checked);
            Ok(())
        }
        ValidationStatus::Fail => {
            let failure = report.first_failure.as_ref().expect("FAIL status always carries a first_failure");
            Err(CliFailure::Domain(format!(
                "validation FAIL at {}: {:?} ({})",
                failure.location, failure.kind, failure.detail
            ))
            .into())
        }
    }
}
