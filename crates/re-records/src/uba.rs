//! UBA Baseline/Delta/Signal records: `spec.md` §3, §4.12. Grounded on
//! `hnmp/engine/host_normalizer.py` (canonical multiset hashing style) and
//! `deception/engine/signal_builder.py` (signal composition, explanation
//! string assembly).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Observed feature multisets for a baseline window. Counts (not just
/// presence) so `FREQUENCY_SHIFT` deltas can be detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedFeatures {
    pub event_types: BTreeMap<String, u64>,
    pub hosts: BTreeMap<String, u64>,
    pub time_buckets: BTreeMap<String, u64>,
    pub privileges: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub baseline_id: String,
    pub identity_id: String,
    pub observed: ObservedFeatures,
    pub baseline_hash: String,
    pub computed_at: String,
}

impl Baseline {
    /// Canonical hash over the observed multisets (`spec.md` §4.12
    /// BaselineHasher).
    pub fn compute_hash(observed: &ObservedFeatures) -> Result<String> {
        Ok(re_canon::sha256_of_canonical(observed, &BTreeSet::new())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaType {
    NewEventType,
    NewHost,
    NewTimeBucket,
    NewPrivilege,
    FrequencyShift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub delta_id: String,
    pub identity_id: String,
    pub delta_type: DeltaType,
    pub field: String,
    pub value: String,
    pub window_start: String,
    pub window_end: String,
}

/// Explicit `[start, end]` window, no implicit rolling windows (`spec.md`
/// §4.12 WindowBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: String,
    pub end: String,
}

impl Window {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub signal_id: String,
    pub delta_ids: Vec<String>,
    pub context_refs: ContextRefs,
    pub confidence_level: String,
    pub explanation: String,
    pub generated_at: String,
    pub immutable_hash: String,
}

/// External context IDs the signal references without mutating them
/// (`spec.md` §4.12: "never mutates referenced entities").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRefs {
    pub killchain_ids: Vec<String>,
    pub graph_ids: Vec<String>,
    pub incident_ids: Vec<String>,
}

const SIGNAL_HASH_EXCLUDED: &[&str] = &["immutable_hash"];

impl Signal {
    pub fn compute_hash(&self) -> Result<String> {
        let excluded: BTreeSet<&str> = SIGNAL_HASH_EXCLUDED.iter().copied().collect();
        Ok(re_canon::sha256_of_canonical(self, &excluded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_hash_changes_when_event_types_change() {
        let mut before = ObservedFeatures::default();
        before.event_types.insert("login".into(), 3);
        let h1 = Baseline::compute_hash(&before).unwrap();

        let mut after = before.clone();
        after
            .event_types
            .insert("privilege_escalation".into(), 1);
        let h2 = Baseline::compute_hash(&after).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn baseline_hash_stable_for_identical_observations() {
        let mut obs = ObservedFeatures::default();
        obs.event_types.insert("login".into(), 3);
        assert_eq!(
            Baseline::compute_hash(&obs).unwrap(),
            Baseline::compute_hash(&obs.clone()).unwrap()
        );
    }
}
