//! BaselineHasher: `spec.md` §4.12. Grounded on
//! `hnmp/engine/host_normalizer.py`'s facts-only aggregation into observed
//! multisets, generalized here to accept any mix of host/process events for
//! one identity over one window.

use re_records::{Baseline, Clock, HostEvent, IdSource, ObservedFeatures, ProcessEvent};

use crate::error::Result;

/// Builds an `ObservedFeatures` multiset from raw events, then hashes it.
/// Drift is detected by comparing hashes across baselines, never by
/// re-deriving the multiset from a stored hash (hashes are one-way).
pub struct BaselineHasher;

impl BaselineHasher {
    /// Fold host events into the observed multiset: one count per event
    /// type, host, hour-truncated time bucket, and (when present in
    /// `event_data`) privilege level.
    pub fn observe_host_events(features: &mut ObservedFeatures, events: &[HostEvent]) {
        for event in events {
            *features
                .event_types
                .entry(format!("{:?}", event.event_type))
                .or_insert(0) += 1;
            *features.hosts.entry(event.host_id.clone()).or_insert(0) += 1;
            *features
                .time_buckets
                .entry(hour_bucket(&event.timestamp))
                .or_insert(0) += 1;
            if let Some(privilege) = event.event_data.get("privilege").and_then(|v| v.as_str()) {
                *features.privileges.entry(privilege.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn observe_process_events(features: &mut ObservedFeatures, events: &[ProcessEvent]) {
        for event in events {
            *features
                .event_types
                .entry(format!("{:?}", event.event_type))
                .or_insert(0) += 1;
            *features.hosts.entry(event.host_id.clone()).or_insert(0) += 1;
            *features
                .time_buckets
                .entry(hour_bucket(&event.timestamp))
                .or_insert(0) += 1;
        }
    }

    /// Compute the canonical hash and wrap it in a stamped `Baseline`
    /// record for the given identity.
    pub fn seal(
        identity_id: impl Into<String>,
        observed: ObservedFeatures,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<Baseline> {
        let baseline_hash = Baseline::compute_hash(&observed)?;
        Ok(Baseline {
            baseline_id: ids.next_id().to_string(),
            identity_id: identity_id.into(),
            observed,
            baseline_hash,
            computed_at: clock.now_rfc3339(),
        })
    }
}

/// Truncate an RFC3339 timestamp to its hour, e.g. `2026-01-01T09:00:00.000Z`
/// -> `2026-01-01T09`. A fixed-width textual bucket, not a parsed duration.
fn hour_bucket(timestamp: &str) -> String {
    timestamp.get(0..13).unwrap_or(timestamp).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use re_records::{FixedClock, HostEventType, SeededIdSource};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn observing_same_events_yields_same_hash() {
        let mut ids = SeededIdSource::new([Uuid::nil(), Uuid::nil()]);
        let clock = FixedClock("2026-01-01T09:00:00.000Z".into());
        let event = HostEvent::new(
            HostEventType::UserLogin,
            "host-1",
            "alice",
            json!({}),
            "linux-agent",
            &mut ids,
            &clock,
        )
        .unwrap();

        let mut first = ObservedFeatures::default();
        BaselineHasher::observe_host_events(&mut first, std::slice::from_ref(&event));
        let mut second = ObservedFeatures::default();
        BaselineHasher::observe_host_events(&mut second, std::slice::from_ref(&event));

        assert_eq!(
            Baseline::compute_hash(&first).unwrap(),
            Baseline::compute_hash(&second).unwrap()
        );
    }

    #[test]
    fn hour_bucket_truncates_to_the_hour() {
        assert_eq!(hour_bucket("2026-01-01T09:42:17.000Z"), "2026-01-01T09");
    }
}
