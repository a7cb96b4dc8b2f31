//! `--record-kind` flag parsing: mirrors `RecordKind`'s
//! `#[serde(rename_all = "snake_case")]` encoding so CLI users spell kinds
//! the same way they see them in exported JSONL.

use anyhow::Context;
use re_records::RecordKind;

use crate::error::CliFailure;

pub fn parse_record_kind(raw: &str) -> anyhow::Result<RecordKind> {
    let kind = match raw {
        "alert" => RecordKind::Alert,
        "host_event" => RecordKind::HostEvent,
        "process_event" => RecordKind::ProcessEvent,
        "routing_decision" => RecordKind::RoutingDecision,
        "suppression" => RecordKind::Suppression,
        "command" => RecordKind::Command,
        "delivery_failure" => RecordKind::DeliveryFailure,
        "delivery_timeout" => RecordKind::DeliveryTimeout,
        "rollback_artifact" => RecordKind::RollbackArtifact,
        "forensic_artifact" => RecordKind::ForensicArtifact,
        "uba_baseline" => RecordKind::UbaBaseline,
        "uba_delta" => RecordKind::UbaDelta,
        "uba_signal" => RecordKind::UbaSignal,
        "interaction_record" => RecordKind::InteractionRecord,
        "risk_score" => RecordKind::RiskScore,
        "playbook_execution" => RecordKind::PlaybookExecution,
        "authority_assertion" => RecordKind::AuthorityAssertion,
        "signed_report" => RecordKind::SignedReport,
        "verification_failed" => RecordKind::VerificationFailed,
        other => {
            return Err(CliFailure::MissingInput(format!("unknown record kind '{other}'")))
                .context("parsing --record-kind")
        }
    };
    Ok(kind)
}
