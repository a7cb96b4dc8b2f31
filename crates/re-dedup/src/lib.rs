//! Deduplicator & Suppressor: `spec.md` §4.11. Grounded on
//! `alert-engine/engine/deduplicator.py` and `alert-engine/engine/suppressor.py`
//! for the dedup key's field selection and reason-coded suppression.

use std::collections::BTreeSet as FieldSet;
use std::collections::HashSet;

use serde::Serialize;

use re_records::{Alert, Clock, IdSource, Severity, Suppression, SuppressionReason};

#[derive(Debug, thiserror::Error)]
pub enum DedupError {
    #[error("canonicalization failed: {0}")]
    Canon(#[from] re_canon::CanonError),
}

pub type Result<T> = std::result::Result<T, DedupError>;

#[derive(Serialize)]
struct DedupKeyFields<'a> {
    incident_id: &'a str,
    policy_rule_id: &'a str,
    severity: Severity,
    risk_score_at_emit: f64,
}

/// `is_duplicate` is a pure function of the alert's dedup-relevant fields
/// and whatever keys have already been seen this process; callers may
/// persist the returned key set and rehydrate a fresh `Deduplicator` from
/// it after a restart (`spec.md` §4.11).
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    pub fn from_seen_keys(seen: impl IntoIterator<Item = String>) -> Self {
        Self {
            seen: seen.into_iter().collect(),
        }
    }

    /// `SHA256(canonical({incident_id, policy_rule_id, severity,
    /// risk_score_at_emit}))` (`spec.md` §4.11).
    pub fn dedup_key(alert: &Alert) -> Result<String> {
        let fields = DedupKeyFields {
            incident_id: &alert.incident_id,
            policy_rule_id: &alert.policy_rule_id,
            severity: alert.severity,
            risk_score_at_emit: alert.risk_score_at_emit,
        };
        Ok(re_canon::sha256_of_canonical(&fields, &FieldSet::new())?)
    }

    /// `false` the first time a dedup key is observed, `true` on every
    /// subsequent alert sharing that key (`spec.md` §8 scenario 4).
    pub fn is_duplicate(&mut self, alert: &Alert) -> Result<bool> {
        let key = Self::dedup_key(alert)?;
        let first_time = self.seen.insert(key);
        Ok(!first_time)
    }

    pub fn seen_keys(&self) -> impl Iterator<Item = &String> {
        self.seen.iter()
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits explicit, reason-coded suppression records when the Router's
/// decision is `suppress` (`spec.md` §4.11).
pub struct Suppressor;

impl Suppressor {
    pub fn new() -> Self {
        Self
    }

    pub fn suppress(
        &self,
        alert_id: impl Into<String>,
        policy_rule_id: impl Into<String>,
        reason: SuppressionReason,
        suppressed_by: impl Into<String>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Suppression {
        Suppression {
            suppression_id: ids.next_id().to_string(),
            alert_id: alert_id.into(),
            policy_rule_id: policy_rule_id.into(),
            suppression_reason: reason,
            suppressed_at: clock.now_rfc3339(),
            suppressed_by: suppressed_by.into(),
            ledger_entry_id: None,
        }
    }
}

impl Default for Suppressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use re_records::{FixedClock, SeededIdSource};
    use uuid::Uuid;

    fn alert(ids: &mut SeededIdSource, clock: &FixedClock) -> Alert {
        Alert::new("I1", "R-ISO", Severity::High, 80.0, None, ids, clock).unwrap()
    }

    #[test]
    fn second_identical_alert_is_flagged_duplicate() {
        let mut ids = SeededIdSource::new([Uuid::nil(), Uuid::from_u128(1)]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let first = alert(&mut ids, &clock);
        let second = alert(&mut ids, &clock);

        let mut dedup = Deduplicator::new();
        assert!(!dedup.is_duplicate(&first).unwrap());
        assert!(dedup.is_duplicate(&second).unwrap());
    }

    #[test]
    fn different_severity_is_not_a_duplicate() {
        let mut ids = SeededIdSource::new([Uuid::nil(), Uuid::from_u128(1)]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let first = alert(&mut ids, &clock);
        let mut second = alert(&mut ids, &clock);
        second.severity = Severity::Low;

        let mut dedup = Deduplicator::new();
        assert!(!dedup.is_duplicate(&first).unwrap());
        assert!(!dedup.is_duplicate(&second).unwrap());
    }

    #[test]
    fn rehydrated_deduplicator_recognizes_prior_keys() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let a = alert(&mut ids, &clock);
        let key = Deduplicator::dedup_key(&a).unwrap();

        let mut rehydrated = Deduplicator::from_seen_keys([key]);
        assert!(rehydrated.is_duplicate(&a).unwrap());
    }

    #[test]
    fn suppressor_stamps_reason_and_actor() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let suppressor = Suppressor::new();
        let suppression = suppressor.suppress(
            "alert-1",
            "rule-1",
            SuppressionReason::Duplicate,
            "dedup-engine",
            &mut ids,
            &clock,
        );
        assert_eq!(suppression.suppression_reason, SuppressionReason::Duplicate);
        assert_eq!(suppression.suppressed_by, "dedup-engine");
    }
}
