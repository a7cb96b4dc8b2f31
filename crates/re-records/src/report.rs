//! SignedReport record (`SPEC_FULL.md` §3 supplement). Grounded on
//! `signed-reporting/crypto/report_verifier.py`,
//! `signed-reporting/engine/render_hasher.py`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    ValidationReport,
    RiskExport,
    LedgerExport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedReport {
    pub report_id: String,
    pub report_kind: ReportKind,
    pub generated_at: String,
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_signature: Option<String>,
}

const SIGNATURE_EXCLUDED: &[&str] = &["report_key_id", "report_signature"];

impl SignedReport {
    pub fn bytes_for_signing(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = SIGNATURE_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }
}
