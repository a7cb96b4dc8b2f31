use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use re_records::{
    ContextRefs, Delta, HostEvent, HostEventType, ObservedFeatures, ProcessEvent, ProcessEventType,
    RandomIdSource, SystemClock,
};
use re_uba::{BaselineHasher, DeltaClassifier, SignalBuilder, WindowBuilder};

use crate::error::CliFailure;
use crate::io_util::{read_json, write_json_pretty};

/// `uba-core/engine/identity_resolver.py`'s `UBA_SOURCE_SYSTEM` default.
const DEFAULT_SOURCE_SYSTEM: &str = "linux-agent";
/// `uba-core/engine/identity_resolver.py`'s `UBA_AUTH_DOMAIN` default.
const DEFAULT_AUTH_DOMAIN: &str = "local";

fn resolved_source_agent(source_agent: Option<String>) -> String {
    source_agent.unwrap_or_else(|| {
        std::env::var("UBA_SOURCE_SYSTEM").unwrap_or_else(|_| DEFAULT_SOURCE_SYSTEM.to_string())
    })
}

/// Qualify `user_id` with `UBA_AUTH_DOMAIN` (`user_id@domain`) unless the
/// caller already supplied a domain-qualified id.
fn resolved_user_id(user_id: String) -> String {
    if user_id.contains('@') {
        return user_id;
    }
    let auth_domain =
        std::env::var("UBA_AUTH_DOMAIN").unwrap_or_else(|_| DEFAULT_AUTH_DOMAIN.to_string());
    format!("{user_id}@{auth_domain}")
}

fn parse_host_event_type(raw: &str) -> anyhow::Result<HostEventType> {
    let kind = match raw {
        "user_login" => HostEventType::UserLogin,
        "user_logout" => HostEventType::UserLogout,
        "privilege_escalation" => HostEventType::PrivilegeEscalation,
        "file_creation" => HostEventType::FileCreation,
        "file_modification" => HostEventType::FileModification,
        "registry_change" => HostEventType::RegistryChange,
        "credential_access_attempt" => HostEventType::CredentialAccessAttempt,
        other => {
            return Err(CliFailure::MissingInput(format!("unknown host event type '{other}'")))
                .context("parsing --event-type")
        }
    };
    Ok(kind)
}

fn parse_process_event_type(raw: &str) -> anyhow::Result<ProcessEventType> {
    let kind = match raw {
        "process_start" => ProcessEventType::ProcessStart,
        "process_exit" => ProcessEventType::ProcessExit,
        "module_load" => ProcessEventType::ModuleLoad,
        "network_connect" => ProcessEventType::NetworkConnect,
        "file_handle_open" => ProcessEventType::FileHandleOpen,
        other => {
            return Err(CliFailure::MissingInput(format!("unknown process event type '{other}'")))
                .context("parsing --event-type")
        }
    };
    Ok(kind)
}

#[derive(Subcommand)]
pub enum UbaCommand {
    /// Build a single HostEvent, defaulting `--source-agent` from
    /// `UBA_SOURCE_SYSTEM` and qualifying `--user-id` with `UBA_AUTH_DOMAIN`
    /// when neither is given explicitly.
    IngestHost {
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        host_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        event_data: PathBuf,
        #[arg(long)]
        source_agent: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Build a single ProcessEvent, defaulting `--source-agent` from
    /// `UBA_SOURCE_SYSTEM` when not given explicitly.
    IngestProcess {
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        host_id: String,
        #[arg(long)]
        process_id: String,
        #[arg(long)]
        parent_process_id: String,
        #[arg(long)]
        event_data: PathBuf,
        #[arg(long)]
        source_agent: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Fold host/process events into an observed-feature multiset and seal
    /// it into a hashed baseline for one identity.
    Baseline {
        #[arg(long)]
        identity_id: String,
        #[arg(long)]
        host_events: Option<PathBuf>,
        #[arg(long)]
        process_events: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Classify the differences between two baselines' observed features
    /// over an explicit window.
    Delta {
        #[arg(long)]
        identity_id: String,
        #[arg(long)]
        before: PathBuf,
        #[arg(long)]
        after: PathBuf,
        #[arg(long)]
        window_start: String,
        #[arg(long, default_value_t = 7)]
        window_days: i64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Compose a signal from a set of deltas plus explicit context
    /// references, without mutating any referenced entity.
    Signal {
        #[arg(long)]
        deltas: PathBuf,
        /// JSON `ContextRefs { killchain_ids, graph_ids, incident_ids }`.
        #[arg(long)]
        context_refs: Option<PathBuf>,
        #[arg(long)]
        confidence_level: String,
        #[arg(long)]
        out: PathBuf,
    },
}

pub fn run(cmd: UbaCommand) -> anyhow::Result<()> {
    match cmd {
        UbaCommand::IngestHost {
            event_type,
            host_id,
            user_id,
            event_data,
            source_agent,
            out,
        } => ingest_host(&event_type, &host_id, &user_id, &event_data, source_agent, &out),
        UbaCommand::IngestProcess {
            event_type,
            host_id,
            process_id,
            parent_process_id,
            event_data,
            source_agent,
            out,
        } => ingest_process(
            &event_type,
            &host_id,
            &process_id,
            &parent_process_id,
            &event_data,
            source_agent,
            &out,
        ),
        UbaCommand::Baseline {
            identity_id,
            host_events,
            process_events,
            out,
        } => baseline(&identity_id, host_events.as_deref(), process_events.as_deref(), &out),
        UbaCommand::Delta {
            identity_id,
            before,
            after,
            window_start,
            window_days,
            out,
        } => delta(&identity_id, &before, &after, &window_start, window_days, &out),
        UbaCommand::Signal {
            deltas,
            context_refs,
            confidence_level,
            out,
        } => signal(&deltas, context_refs.as_deref(), &confidence_level, &out),
    }
}

fn ingest_host(
    event_type: &str,
    host_id: &str,
    user_id: &str,
    event_data_path: &PathBuf,
    source_agent: Option<String>,
    out: &PathBuf,
) -> anyhow::Result<()> {
    let event_type = parse_host_event_type(event_type)?;
    let event_data = read_json(event_data_path)?;
    let mut ids = RandomIdSource;
    let clock = SystemClock;

    let event = HostEvent::new(
        event_type,
        host_id,
        resolved_user_id(user_id.to_string()),
        event_data,
        resolved_source_agent(source_agent),
        &mut ids,
        &clock,
    )
    .map_err(|e| CliFailure::Domain(e.to_string()))
    .context("building host event")?;

    write_json_pretty(out, &event)?;
    println!("host event {} hash {}", event.event_id, event.immutable_hash);
    Ok(())
}

fn ingest_process(
    event_type: &str,
    host_id: &str,
    process_id: &str,
    parent_process_id: &str,
    event_data_path: &PathBuf,
    source_agent: Option<String>,
    out: &PathBuf,
) -> anyhow::Result<()> {
    let event_type = parse_process_event_type(event_type)?;
    let event_data = read_json(event_data_path)?;
    let mut ids = RandomIdSource;
    let clock = SystemClock;

    let event = ProcessEvent::new(
        event_type,
        host_id,
        process_id,
        parent_process_id,
        event_data,
        resolved_source_agent(source_agent),
        &mut ids,
        &clock,
    )
    .map_err(|e| CliFailure::Domain(e.to_string()))
    .context("building process event")?;

    write_json_pretty(out, &event)?;
    println!("process event {} hash {}", event.event_id, event.immutable_hash);
    Ok(())
}

fn baseline(
    identity_id: &str,
    host_events_path: Option<&std::path::Path>,
    process_events_path: Option<&std::path::Path>,
    out: &PathBuf,
) -> anyhow::Result<()> {
    if host_events_path.is_none() && process_events_path.is_none() {
        return Err(CliFailure::MissingInput("at least one of --host-events or --process-events is required".into()).into());
    }

    let mut observed = ObservedFeatures::default();
    if let Some(path) = host_events_path {
        let events: Vec<HostEvent> = read_json(path)?;
        BaselineHasher::observe_host_events(&mut observed, &events);
    }
    if let Some(path) = process_events_path {
        let events: Vec<ProcessEvent> = read_json(path)?;
        BaselineHasher::observe_process_events(&mut observed, &events);
    }

    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let baseline = BaselineHasher::seal(identity_id, observed, &mut ids, &clock)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("sealing baseline")?;

    write_json_pretty(out, &baseline)?;
    println!("baseline {} hash {}", baseline.baseline_id, baseline.baseline_hash);
    Ok(())
}

fn delta(
    identity_id: &str,
    before_path: &PathBuf,
    after_path: &PathBuf,
    window_start: &str,
    window_days: i64,
    out: &PathBuf,
) -> anyhow::Result<()> {
    let before: re_records::Baseline = read_json(before_path)?;
    let after: re_records::Baseline = read_json(after_path)?;

    let window = WindowBuilder::new(window_days)
        .build(window_start)
        .map_err(|e| CliFailure::MissingInput(e.to_string()))
        .context("building observation window")?;

    let mut ids = RandomIdSource;
    let deltas = DeltaClassifier::classify(identity_id, &before.observed, &after.observed, &window, &mut ids);

    write_json_pretty(out, &deltas)?;
    println!("classified {} delta(s) for identity {identity_id}", deltas.len());
    Ok(())
}

fn signal(
    deltas_path: &PathBuf,
    context_refs_path: Option<&std::path::Path>,
    confidence_level: &str,
    out: &PathBuf,
) -> anyhow::Result<()> {
    let deltas: Vec<Delta> = read_json(deltas_path)?;
    let context_refs: ContextRefs = match context_refs_path {
        Some(path) => read_json(path)?,
        None => ContextRefs::default(),
    };

    let mut ids = RandomIdSource;
    let clock = SystemClock;
    let signal = SignalBuilder::build(&deltas, context_refs, confidence_level, &mut ids, &clock)
        .map_err(|e| CliFailure::Domain(e.to_string()))
        .context("building signal")?;

    write_json_pretty(out, &signal)?;
    println!("signal {} hash {}", signal.signal_id, signal.immutable_hash);
    Ok(())
}
