//! Alert record: `spec.md` §3, chained within an incident by
//! `prev_alert_hash`. Grounded on `alert-engine/engine/deduplicator.py`'s
//! `get_previous_alert_hash` for the chain-linking rule.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::factory::{Clock, IdSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub incident_id: String,
    pub policy_rule_id: String,
    pub severity: Severity,
    pub risk_score_at_emit: f64,
    pub emitted_at: String,
    pub immutable_hash: String,
    pub prev_alert_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_entry_id: Option<String>,
}

const HASH_EXCLUDED: &[&str] = &["immutable_hash", "ledger_entry_id"];

impl Alert {
    /// Construct a new alert. `prev_alert_hash` is the immutable hash of the
    /// immediately prior alert in the same incident ordered by
    /// `emitted_at`, or the zero hash for the first alert in an incident
    /// (`spec.md` §4.5, kind-specific policy for Alert).
    pub fn new(
        incident_id: impl Into<String>,
        policy_rule_id: impl Into<String>,
        severity: Severity,
        risk_score_at_emit: f64,
        prev_alert_hash: Option<&str>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<Self> {
        let incident_id = incident_id.into();
        let policy_rule_id = policy_rule_id.into();
        if incident_id.is_empty() {
            return Err(RecordError::MissingField {
                field: "incident_id",
            });
        }
        if policy_rule_id.is_empty() {
            return Err(RecordError::MissingField {
                field: "policy_rule_id",
            });
        }
        if !(0.0..=100.0).contains(&risk_score_at_emit) {
            return Err(RecordError::OutOfRange(
                "risk_score_at_emit",
                0.0,
                100.0,
                risk_score_at_emit,
            ));
        }

        let mut alert = Alert {
            alert_id: ids.next_id().to_string(),
            incident_id,
            policy_rule_id,
            severity,
            risk_score_at_emit,
            emitted_at: clock.now_rfc3339(),
            immutable_hash: String::new(),
            prev_alert_hash: prev_alert_hash
                .map(str::to_string)
                .unwrap_or_else(re_canon::zero_hash),
            ledger_entry_id: None,
        };
        alert.immutable_hash = Self::compute_hash(&alert)?;
        Ok(alert)
    }

    fn compute_hash(alert: &Alert) -> Result<String> {
        let excluded: BTreeSet<&str> = HASH_EXCLUDED.iter().copied().collect();
        Ok(re_canon::sha256_of_canonical(alert, &excluded)?)
    }

    /// Recompute `immutable_hash` for integrity checking (used by the
    /// validator's simulation checks).
    pub fn recompute_hash(&self) -> Result<String> {
        Self::compute_hash(self)
    }
}

/// Pick the previous alert's `immutable_hash` for chaining, given all alerts
/// for an incident ordered by `emitted_at` ascending (`spec.md` §4.5).
pub fn prev_alert_hash_for(incident_alerts_by_emitted_at: &[&Alert]) -> String {
    match incident_alerts_by_emitted_at.last() {
        Some(a) => a.immutable_hash.clone(),
        None => re_canon::zero_hash(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{FixedClock, SeededIdSource};
    use uuid::Uuid;

    #[test]
    fn first_alert_in_incident_has_zero_prev_hash() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let alert = Alert::new(
            "I1",
            "R-ISO",
            Severity::High,
            80.0,
            None,
            &mut ids,
            &clock,
        )
        .unwrap();
        assert_eq!(alert.prev_alert_hash, re_canon::zero_hash());
        assert_eq!(alert.immutable_hash.len(), 64);
    }

    #[test]
    fn rejects_out_of_range_score() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let err = Alert::new("I1", "R-ISO", Severity::High, 150.0, None, &mut ids, &clock)
            .unwrap_err();
        assert!(matches!(err, RecordError::OutOfRange(..)));
    }

    #[test]
    fn hash_is_stable_across_reserialization() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let alert = Alert::new("I1", "R-ISO", Severity::High, 80.0, None, &mut ids, &clock)
            .unwrap();
        let json = serde_json::to_string(&alert).unwrap();
        let parsed: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.recompute_hash().unwrap(), alert.immutable_hash);
    }
}
