use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use re_crypto::KeyStore;
use re_records::{Clock, IdSource, RandomIdSource, SystemClock};
use re_store::OpenMode;
use re_uba::{Normalizer, RiskComponent, RiskScoreStore};

use crate::error::CliFailure;
use crate::io_util::{read_json, write_json_pretty};

#[derive(Subcommand)]
pub enum RiskCommand {
    /// Normalize a set of raw risk components into a single risk score.
    Normalize {
        #[arg(long)]
        identity_id: String,
        /// JSON array of `RiskComponent { name, raw_value, confidence }`.
        #[arg(long)]
        components: PathBuf,
        #[arg(long)]
        completeness: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Append a previously computed risk score to its store.
    Append {
        #[arg(long)]
        risk_store: PathBuf,
        #[arg(long)]
        score: PathBuf,
    },
    /// Export every stored risk score as JSON, JSONL, or CSV, sealed into a
    /// signed report alongside it.
    Export {
        #[arg(long)]
        risk_store: PathBuf,
        #[arg(long, default_value = "jsonl")]
        format: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        #[arg(long)]
        signing_key_id: String,
    },
}

pub fn run(cmd: RiskCommand) -> anyhow::Result<()> {
    match cmd {
        RiskCommand::Normalize {
            identity_id,
            components,
            completeness,
            out,
        } => normalize(&identity_id, &components, completeness, &out),
        RiskCommand::Append { risk_store, score } => append(&risk_store, &score),
        RiskCommand::Export {
            risk_store,
            format,
            out,
            keys,
            signing_key_id,
        } => export(&risk_store, &format, &out, &keys, &signing_key_id),
    }
}

fn normalize(identity_id: &str, components_path: &PathBuf, completeness: f64, out: &PathBuf) -> anyhow::Result<()> {
    let components: Vec<RiskComponent> = read_json(components_path)?;
    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let score = Normalizer::normalize(identity_id, &components, completeness, &mut ids, &clock)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("normalizing risk components")?;

    write_json_pretty(out, &score)?;
    println!("risk score {} band {:?} ({:.1})", score.score_id, score.severity_band, score.normalized_score);
    Ok(())
}

fn append(risk_store_path: &PathBuf, score_path: &PathBuf) -> anyhow::Result<()> {
    let score = read_json(score_path)?;
    let mut store = RiskScoreStore::open(risk_store_path, OpenMode::ReadWrite)
        .map_err(|e| CliFailure::Io(format!("opening risk store: {e}")))?;
    store
        .append(&score)
        .map_err(|e| CliFailure::Io(format!("appending risk score: {e}")))?;
    println!("appended risk score");
    Ok(())
}

fn export(
    risk_store_path: &PathBuf,
    format: &str,
    out: &PathBuf,
    keys_dir: &PathBuf,
    signing_key_id: &str,
) -> anyhow::Result<()> {
    let store = RiskScoreStore::open(risk_store_path, OpenMode::ReadOnly)
        .map_err(|e| CliFailure::Io(format!("opening risk store: {e}")))?;
    let scores = store
        .read_all()
        .map_err(|e| CliFailure::Io(format!("reading risk store: {e}")))?;

    match format {
        "json" => write_json_pretty(out, &scores)?,
        "jsonl" => crate::io_util::write_jsonl(out, &scores)?,
        "csv" => write_csv(out, &scores)?,
        other => return Err(CliFailure::MissingInput(format!("unknown export format '{other}'")).into()),
    }

    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let signing_key = keystore
        .load_private(signing_key_id)
        .map_err(|e| CliFailure::MissingInput(format!("loading private key {signing_key_id}: {e}")))?;
    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let signed_report = re_replay::seal_risk_export(
        out,
        &signing_key,
        signing_key_id.to_string(),
        ids.next_id().to_string(),
        clock.now_rfc3339(),
    )
    .map_err(|e| CliFailure::Domain(e.to_string()))
    .context("sealing risk export")?;
    let report_path = sibling_report_path(out);
    write_json_pretty(&report_path, &signed_report)?;

    println!("exported {} risk scores, signed report at {}", scores.len(), report_path.display());
    Ok(())
}

fn sibling_report_path(out: &PathBuf) -> PathBuf {
    let mut file_name = out.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    file_name.push(".signed-report.json");
    out.with_file_name(file_name)
}

fn write_csv(out: &PathBuf, scores: &[re_records::RiskScore]) -> anyhow::Result<()> {
    let file = File::create(out)
        .map_err(|e| CliFailure::Io(format!("creating {}: {e}", out.display())))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "score_id,identity_id,normalized_score,severity_band,confidence,timestamp,raw_components")
        .map_err(|e| CliFailure::Io(e.to_string()))?;
    for score in scores {
        let raw_components = score
            .raw_components
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        writeln!(
            writer,
            "{},{},{},{:?},{},{},\"{}\"",
            score.score_id,
            score.identity_id,
            score.normalized_score,
            score.severity_band,
            score.confidence,
            score.timestamp,
            raw_components
        )
        .map_err(|e| CliFailure::Io(e.to_string()))?;
    }
    Ok(())
}
