use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;

use re_crypto::KeyStore;
use re_dispatch::{CommandDispatcher, CommandExecutor, ExecutorOutcome, StaticTargetResolver};
use re_ledger::AuditLedger;
use re_records::{AuthorityAssertion, RandomIdSource, RollbackType, RoutingDecision, SystemClock};
use re_store::{AppendOnlyStore, OpenMode};

use crate::error::CliFailure;
use crate::io_util::read_json;

#[derive(Subcommand)]
pub enum DispatchCommand {
    /// Build, sign, persist, and hand a command off to the executor for one
    /// routing decision. The executor here is a stand-in that always
    /// reports delivery success — the real effector is out of scope and
    /// opaque to this crate.
    Command {
        #[arg(long)]
        routing_decision: PathBuf,
        #[arg(long)]
        command_type: String,
        #[arg(long)]
        incident_id: String,
        #[arg(long)]
        policy_id: String,
        #[arg(long)]
        policy_version: String,
        #[arg(long)]
        issuing_authority: String,
        #[arg(long)]
        authority_assertion: Option<PathBuf>,
        #[arg(long, default_value = "network_isolation")]
        rollback_type: String,
        #[arg(long, default_value_t = 30)]
        deadline_secs: u64,
        /// JSON map of incident_id -> delivery target.
        #[arg(long)]
        targets: PathBuf,
        #[arg(long)]
        commands_store: PathBuf,
        #[arg(long)]
        rollback_store: PathBuf,
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        #[arg(long)]
        signing_key_id: String,
    },
}

pub fn run(cmd: DispatchCommand) -> anyhow::Result<()> {
    match cmd {
        DispatchCommand::Command {
            routing_decision,
            command_type,
            incident_id,
            policy_id,
            policy_version,
            issuing_authority,
            authority_assertion,
            rollback_type,
            deadline_secs,
            targets,
            commands_store,
            rollback_store,
            ledger,
            keys,
            signing_key_id,
        } => dispatch_command(
            &routing_decision,
            &command_type,
            &incident_id,
            &policy_id,
            &policy_version,
            &issuing_authority,
            authority_assertion.as_deref(),
            &rollback_type,
            deadline_secs,
            &targets,
            &commands_store,
            &rollback_store,
            &ledger,
            &keys,
            &signing_key_id,
        ),
    }
}

struct AlwaysDeliversExecutor;

impl CommandExecutor for AlwaysDeliversExecutor {
    fn execute(&mut self, command: &re_records::SignedCommand, _deadline: Duration) -> ExecutorOutcome {
        tracing::info!(command_id = %command.payload.command_id, target = %command.payload.target, "delivering command (stand-in executor)");
        ExecutorOutcome::Delivered {
            original_state_snapshot: Value::Object(Default::default()),
        }
    }
}

fn parse_rollback_type(raw: &str) -> anyhow::Result<RollbackType> {
    Ok(match raw {
        "network_isolation" => RollbackType::NetworkIsolation,
        "file_quarantine" => RollbackType::FileQuarantine,
        "process_termination" => RollbackType::ProcessTermination,
        "access_revocation" => RollbackType::AccessRevocation,
        other => return Err(CliFailure::MissingInput(format!("unknown rollback type '{other}'")).into()),
    })
}

#[allow(clippy::too_many_arguments)]
fn dispatch_command(
    routing_decision_path: &PathBuf,
    command_type: &str,
    incident_id: &str,
    policy_id: &str,
    policy_version: &str,
    issuing_authority: &str,
    authority_assertion_path: Option<&std::path::Path>,
    rollback_type: &str,
    deadline_secs: u64,
    targets_path: &PathBuf,
    commands_store_path: &PathBuf,
    rollback_store_path: &PathBuf,
    ledger_path: &PathBuf,
    keys_dir: &PathBuf,
    signing_key_id: &str,
) -> anyhow::Result<()> {
    let routing_decision: RoutingDecision = read_json(routing_decision_path)?;
    let authority_assertion: Option<AuthorityAssertion> = authority_assertion_path
        .map(|p| read_json(p))
        .transpose()?;
    let targets_map: HashMap<String, String> = read_json(targets_path)?;
    let rollback_type = parse_rollback_type(rollback_type)?;

    let keystore = KeyStore::open(keys_dir)
        .map_err(|e| CliFailure::MissingInput(format!("opening key directory {}: {e}", keys_dir.display())))?;
    let signing_key = keystore
        .load_private(signing_key_id)
        .map_err(|e| CliFailure::MissingInput(format!("loading private key {signing_key_id}: {e}")))?;

    let mut commands_store = AppendOnlyStore::open(commands_store_path, OpenMode::ReadWrite)
        .map_err(|e| CliFailure::Io(format!("opening commands store: {e}")))?;
    let mut rollback_store = AppendOnlyStore::open(rollback_store_path, OpenMode::ReadWrite)
        .map_err(|e| CliFailure::Io(format!("opening rollback store: {e}")))?;
    let mut ledger = AuditLedger::open(ledger_path, OpenMode::ReadWrite)
        .map_err(|e| CliFailure::Io(format!("opening ledger: {e}")))?;

    let targets = StaticTargetResolver::new(targets_map);
    let mut dispatcher = CommandDispatcher::new(signing_key, signing_key_id.to_string(), targets, AlwaysDeliversExecutor);

    let mut ids = RandomIdSource;
    let clock = SystemClock;

    let outcome = dispatcher
        .dispatch(
            &routing_decision,
            command_type.to_string(),
            incident_id.to_string(),
            policy_id.to_string(),
            policy_version.to_string(),
            issuing_authority.to_string(),
            authority_assertion.as_ref(),
            rollback_type,
            Duration::from_secs(deadline_secs),
            &mut ids,
            &clock,
            &mut commands_store,
            &mut rollback_store,
            &mut ledger,
        )
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("dispatching command")?;

    println!(
        "command {} dispatched; rollback recorded: {}",
        outcome.command.payload.command_id,
        outcome.rollback_artifact.is_some()
    );
    Ok(())
}
