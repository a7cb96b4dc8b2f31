//! Structured validation outcome and its sealing into a `SignedReport`.

use std::collections::BTreeSet;
use std::path::Path;

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

use re_records::{ReportKind, SignedReport};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FailureKind {
    LedgerSeqMismatch,
    LedgerChainBroken,
    MissingDomainRecord,
    ImmutableHashMismatch,
    CustodySignatureInvalid,
    PolicyPriorityConflict,
    RoutingSimulationMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstFailure {
    pub kind: FailureKind,
    pub location: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

/// `spec.md` §4.10: "Outputs a signed validation report with the first
/// failure (check type, location, error) and a status of PASS | FAIL."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: ValidationStatus,
    pub entries_checked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_failure: Option<FirstFailure>,
}

impl ValidationReport {
    pub fn pass(entries_checked: usize) -> Self {
        Self {
            validation_status: ValidationStatus::Pass,
            entries_checked,
            first_failure: None,
        }
    }

    pub fn fail(entries_checked: usize, failure: FirstFailure) -> Self {
        Self {
            validation_status: ValidationStatus::Fail,
            entries_checked,
            first_failure: Some(failure),
        }
    }
}

/// Build a `SignedReport` of `report_kind` over an already-computed
/// `content_hash`, then sign it. Shared by every `seal_*` function below —
/// the three named `SignedReport` kinds (`spec.md` §3: "validation report,
/// risk export, ledger export") differ only in what gets hashed.
fn seal_report(
    report_kind: ReportKind,
    content_hash: String,
    signing_key: &SigningKey,
    signing_key_id: impl Into<String>,
    report_id: impl Into<String>,
    generated_at: impl Into<String>,
) -> Result<SignedReport> {
    let mut signed = SignedReport {
        report_id: report_id.into(),
        report_kind,
        generated_at: generated_at.into(),
        content_hash,
        report_key_id: None,
        report_signature: None,
    };
    let bytes = signed.bytes_for_signing()?;
    signed.report_signature = Some(re_crypto::sign_canonical(signing_key, &bytes));
    signed.report_key_id = Some(signing_key_id.into());
    Ok(signed)
}

/// Seal a `ValidationReport` into a `SignedReport` under the validator's own
/// key (`spec.md` §4.10, `SPEC_FULL.md` §4.10).
pub fn seal_validation_report(
    report: &ValidationReport,
    signing_key: &SigningKey,
    signing_key_id: impl Into<String>,
    report_id: impl Into<String>,
    generated_at: impl Into<String>,
) -> Result<SignedReport> {
    let content_hash = re_canon::sha256_of_canonical(report, &BTreeSet::new())?;
    seal_report(
        ReportKind::ValidationReport,
        content_hash,
        signing_key,
        signing_key_id,
        report_id,
        generated_at,
    )
}

/// Seal an on-disk risk-score export: `content_hash` is the SHA-256 of the
/// exported file's bytes, matching `ForensicArtifact`'s content-addressing
/// rather than a canonical-JSON hash (the export may be CSV, not JSON).
pub fn seal_risk_export(
    exported_file: &Path,
    signing_key: &SigningKey,
    signing_key_id: impl Into<String>,
    report_id: impl Into<String>,
    generated_at: impl Into<String>,
) -> Result<SignedReport> {
    let content_hash = re_canon::sha256_of_path(exported_file)?;
    seal_report(
        ReportKind::RiskExport,
        content_hash,
        signing_key,
        signing_key_id,
        report_id,
        generated_at,
    )
}

/// Seal an on-disk ledger export, by file hash — same contract as
/// [`seal_risk_export`].
pub fn seal_ledger_export(
    exported_file: &Path,
    signing_key: &SigningKey,
    signing_key_id: impl Into<String>,
    report_id: impl Into<String>,
    generated_at: impl Into<String>,
) -> Result<SignedReport> {
    let content_hash = re_canon::sha256_of_path(exported_file)?;
    seal_report(
        ReportKind::LedgerExport,
        content_hash,
        signing_key,
        signing_key_id,
        report_id,
        generated_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn seal_validation_report_round_trips() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let report = ValidationReport::pass(12);
        let signed = seal_validation_report(&report, &signing_key, "key-1", "r-1", "2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(signed.report_kind, ReportKind::ValidationReport);
        let bytes = signed.bytes_for_signing().unwrap();
        re_crypto::verify_canonical(&signing_key.verifying_key(), &bytes, signed.report_signature.as_deref().unwrap()).unwrap();
    }

    #[test]
    fn seal_risk_export_hashes_the_exported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.csv");
        std::fs::write(&path, b"score_id,identity_id\n1,host-1\n").unwrap();
        let signing_key = SigningKey::generate(&mut OsRng);

        let signed = seal_risk_export(&path, &signing_key, "key-1", "r-2", "2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(signed.report_kind, ReportKind::RiskExport);
        assert_eq!(signed.content_hash, re_canon::sha256_of_path(&path).unwrap());
    }

    #[test]
    fn seal_ledger_export_hashes_the_exported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        std::fs::write(&path, b"{\"seq\":1}\n").unwrap();
        let signing_key = SigningKey::generate(&mut OsRng);

        let signed = seal_ledger_export(&path, &signing_key, "key-1", "r-3", "2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(signed.report_kind, ReportKind::LedgerExport);
        assert_eq!(signed.content_hash, re_canon::sha256_of_path(&path).unwrap());
    }
}
