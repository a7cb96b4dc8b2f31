//! SignalBuilder (UBA): `spec.md` §4.12. Grounded on
//! `deception/engine/signal_builder.py`'s composition of a signal record
//! from delta/interaction ids plus explicit context references, and its
//! plain-English explanation-string assembly.

use re_records::{Clock, ContextRefs, Delta, IdSource, Signal};

pub struct SignalBuilder;

impl SignalBuilder {
    /// Compose a signal from a set of deltas and explicit context
    /// references. Never mutates the referenced killchain/graph/incident
    /// entities — the signal only carries their ids forward.
    pub fn build(
        deltas: &[Delta],
        context_refs: ContextRefs,
        confidence_level: impl Into<String>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> crate::error::Result<Signal> {
        let explanation = explain(deltas);
        let mut signal = Signal {
            signal_id: ids.next_id().to_string(),
            delta_ids: deltas.iter().map(|d| d.delta_id.clone()).collect(),
            context_refs,
            confidence_level: confidence_level.into(),
            explanation,
            generated_at: clock.now_rfc3339(),
            immutable_hash: String::new(),
        };
        signal.immutable_hash = signal.compute_hash()?;
        Ok(signal)
    }
}

/// Plain-English summary of the deltas behind a signal, e.g. "3 deltas for
/// identity alice: 2 new_event_type, 1 frequency_shift".
fn explain(deltas: &[Delta]) -> String {
    if deltas.is_empty() {
        return "no deltas observed".to_string();
    }
    let identity_id = deltas[0].identity_id.clone();
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for delta in deltas {
        *counts.entry(format!("{:?}", delta.delta_type)).or_insert(0) += 1;
    }
    let breakdown = counts
        .into_iter()
        .map(|(kind, count)| format!("{count} {kind}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} delta(s) for identity {identity_id}: {breakdown}",
        deltas.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use re_records::{DeltaType, FixedClock, SeededIdSource, Window};
    use uuid::Uuid;

    fn delta(identity_id: &str, delta_type: DeltaType) -> Delta {
        Delta {
            delta_id: "d1".into(),
            identity_id: identity_id.into(),
            delta_type,
            field: "login".into(),
            value: "1".into(),
            window_start: Window::new("a", "b").start,
            window_end: Window::new("a", "b").end,
        }
    }

    #[test]
    fn explanation_mentions_identity_and_delta_counts() {
        let deltas = vec![
            delta("alice", DeltaType::NewEventType),
            delta("alice", DeltaType::NewEventType),
            delta("alice", DeltaType::FrequencyShift),
        ];
        let text = explain(&deltas);
        assert!(text.contains("alice"));
        assert!(text.contains("2 NewEventType"));
        assert!(text.contains("1 FrequencyShift"));
    }

    #[test]
    fn signal_references_all_delta_ids_without_mutating_context() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-08T00:00:00.000Z".into());
        let deltas = vec![delta("alice", DeltaType::NewHost)];
        let context = ContextRefs {
            killchain_ids: vec!["kc-1".into()],
            graph_ids: vec![],
            incident_ids: vec![],
        };
        let signal = SignalBuilder::build(&deltas, context.clone(), "MEDIUM", &mut ids, &clock).unwrap();
        assert_eq!(signal.delta_ids, vec!["d1".to_string()]);
        assert_eq!(signal.context_refs, context);
        assert_eq!(signal.immutable_hash.len(), 64);
    }
}
