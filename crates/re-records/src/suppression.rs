//! Suppression record: `spec.md` §3, §4.9 Suppressor. Grounded on
//! `alert-engine/engine/suppressor.py`'s `create_suppression` dict shape.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuppressionReason {
    Duplicate,
    PolicySuppressed,
    ManualOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suppression {
    pub suppression_id: String,
    pub alert_id: String,
    pub policy_rule_id: String,
    pub suppression_reason: SuppressionReason,
    pub suppressed_at: String,
    pub suppressed_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_entry_id: Option<String>,
}

const LINK_EXCLUDED: &[&str] = &["ledger_entry_id"];

impl Suppression {
    /// Canonical bytes for dedup/comparison, excluding the backfilled
    /// ledger link (`spec.md` §4.4: records never embed their own ledger
    /// placement before that placement happens).
    pub fn canonical_for_comparison(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = LINK_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_entry_id_excluded_from_comparison() {
        let mut s = Suppression {
            suppression_id: "sup-1".into(),
            alert_id: "alert-1".into(),
            policy_rule_id: "rule-1".into(),
            suppression_reason: SuppressionReason::Duplicate,
            suppressed_at: "2026-01-01T00:00:00.000Z".into(),
            suppressed_by: "dedup-engine".into(),
            ledger_entry_id: None,
        };
        let before = s.canonical_for_comparison().unwrap();
        s.ledger_entry_id = Some("le-1".into());
        let after = s.canonical_for_comparison().unwrap();
        assert_eq!(before, after);
    }
}
