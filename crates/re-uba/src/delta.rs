//! DeltaClassifier: `spec.md` §4.12. Classification is type-only — it makes
//! **no** statement about severity, intent, or threat, matching
//! `hnmp/engine/host_normalizer.py`'s strict facts-only normalization.

use re_records::{Delta, DeltaType, IdSource, ObservedFeatures, Window};

/// Compares a prior baseline's observed multiset against a fresh one over
/// an explicit window, emitting one `Delta` per new key or per-key
/// frequency shift. Never compares hashes directly — a drifted hash only
/// tells you *that* something changed, not *what*.
pub struct DeltaClassifier;

impl DeltaClassifier {
    pub fn classify(
        identity_id: impl Into<String>,
        before: &ObservedFeatures,
        after: &ObservedFeatures,
        window: &Window,
        ids: &mut impl IdSource,
    ) -> Vec<Delta> {
        let identity_id = identity_id.into();
        let mut deltas = Vec::new();

        classify_map(
            &identity_id,
            &before.event_types,
            &after.event_types,
            DeltaType::NewEventType,
            window,
            ids,
            &mut deltas,
        );
        classify_map(
            &identity_id,
            &before.hosts,
            &after.hosts,
            DeltaType::NewHost,
            window,
            ids,
            &mut deltas,
        );
        classify_map(
            &identity_id,
            &before.time_buckets,
            &after.time_buckets,
            DeltaType::NewTimeBucket,
            window,
            ids,
            &mut deltas,
        );
        classify_map(
            &identity_id,
            &before.privileges,
            &after.privileges,
            DeltaType::NewPrivilege,
            window,
            ids,
            &mut deltas,
        );

        deltas
    }
}

fn classify_map(
    identity_id: &str,
    before: &std::collections::BTreeMap<String, u64>,
    after: &std::collections::BTreeMap<String, u64>,
    new_key_type: DeltaType,
    window: &Window,
    ids: &mut impl IdSource,
    out: &mut Vec<Delta>,
) {
    for (field, after_count) in after {
        match before.get(field) {
            None => out.push(Delta {
                delta_id: ids.next_id().to_string(),
                identity_id: identity_id.to_string(),
                delta_type: new_key_type,
                field: field.clone(),
                value: after_count.to_string(),
                window_start: window.start.clone(),
                window_end: window.end.clone(),
            }),
            Some(before_count) if before_count != after_count => out.push(Delta {
                delta_id: ids.next_id().to_string(),
                identity_id: identity_id.to_string(),
                delta_type: DeltaType::FrequencyShift,
                field: field.clone(),
                value: format!("{before_count}->{after_count}"),
                window_start: window.start.clone(),
                window_end: window.end.clone(),
            }),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use re_records::SeededIdSource;
    use uuid::Uuid;

    fn window() -> Window {
        Window::new("2026-01-01T00:00:00.000Z", "2026-01-08T00:00:00.000Z")
    }

    #[test]
    fn new_event_type_is_classified_as_new_event_type() {
        let before = ObservedFeatures::default();
        let mut after = ObservedFeatures::default();
        after.event_types.insert("login".into(), 1);

        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let deltas = DeltaClassifier::classify("alice", &before, &after, &window(), &mut ids);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].delta_type, DeltaType::NewEventType);
        assert_eq!(deltas[0].field, "login");
    }

    #[test]
    fn changed_frequency_is_classified_as_frequency_shift() {
        let mut before = ObservedFeatures::default();
        before.hosts.insert("host-1".into(), 2);
        let mut after = ObservedFeatures::default();
        after.hosts.insert("host-1".into(), 9);

        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let deltas = DeltaClassifier::classify("alice", &before, &after, &window(), &mut ids);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].delta_type, DeltaType::FrequencyShift);
        assert_eq!(deltas[0].value, "2->9");
    }

    #[test]
    fn identical_features_yield_no_deltas() {
        let mut features = ObservedFeatures::default();
        features.event_types.insert("login".into(), 1);

        let mut ids = SeededIdSource::new([]);
        let deltas = DeltaClassifier::classify("alice", &features.clone(), &features, &window(), &mut ids);

        assert!(deltas.is_empty());
    }
}
