//! ReplayEngine & Validator: `spec.md` §4.10. Read-only over a ledger plus
//! caller-supplied domain lookups and artifacts — produces a signed
//! [`report::ValidationReport`] describing the first failure found, if any.

pub mod domain_lookup;
pub mod error;
pub mod report;
pub mod validator;

pub use domain_lookup::{DomainLookup, HashDomainIndex};
pub use error::{ReplayError, Result};
pub use report::{
    seal_ledger_export, seal_risk_export, seal_validation_report, FailureKind, FirstFailure,
    ValidationReport, ValidationStatus,
};
pub use validator::{CustodyArtifact, RoutingSimulation, Validator};

use re_records::{Alert, ExplanationReference, PolicyBundle, RoutingAction, RoutingDecision};

/// Recompute the routing decision for `alert` against `bundle`, exactly as
/// `re_policy::Router::route_alert` would, but taking `decision_id` and
/// `decision_timestamp` as explicit inputs instead of generating fresh ones.
///
/// `spec.md` §8: "replaying... yields a byte-identical decision record up to
/// the fresh decision_id and decision_timestamp, which are supplied as
/// inputs during replay" — this is that replay path, kept independent of
/// `re_policy::Router` so the validator never needs a live id/clock source.
pub fn replay_routing_decision(
    bundle: &PolicyBundle,
    alert: &Alert,
    decision_id: String,
    decision_timestamp: String,
) -> RoutingDecision {
    let rules = bundle.rules_by_descending_priority();

    match rules.iter().find(|rule| all_predicates_match(rule, alert)) {
        Some(rule) => RoutingDecision {
            decision_id,
            alert_id: alert.alert_id.clone(),
            rule_id: rule.rule_id.clone(),
            routing_action: RoutingAction::new(
                rule.allowed_actions
                    .first()
                    .map(String::as_str)
                    .unwrap_or(RoutingAction::NOTIFY),
            ),
            required_authority: rule.required_authority,
            explanation_reference: ExplanationReference {
                explanation_template_id: rule.explanation_template_id.clone(),
                explanation_bundle_id: bundle.bundle_id.clone(),
            },
            decision_timestamp,
            ledger_entry_id: None,
        },
        None => RoutingDecision {
            decision_id,
            alert_id: alert.alert_id.clone(),
            rule_id: String::new(),
            routing_action: RoutingAction::new(RoutingAction::NOTIFY),
            required_authority: re_records::AuthorityLevel::None,
            explanation_reference: ExplanationReference {
                explanation_template_id: "default-notify".to_string(),
                explanation_bundle_id: bundle.bundle_id.clone(),
            },
            decision_timestamp,
            ledger_entry_id: None,
        },
    }
}

fn all_predicates_match(rule: &re_records::Rule, alert: &Alert) -> bool {
    rule.match_predicates.iter().all(|predicate| {
        let value = match predicate.field.as_str() {
            "incident_id" => Some(alert.incident_id.clone()),
            "policy_rule_id" => Some(alert.policy_rule_id.clone()),
            "severity" => Some(severity_as_str(alert.severity).to_string()),
            _ => None,
        };
        value.as_deref() == Some(predicate.equals.as_str())
    })
}

fn severity_as_str(severity: re_records::Severity) -> &'static str {
    match severity {
        re_records::Severity::Low => "LOW",
        re_records::Severity::Medium => "MEDIUM",
        re_records::Severity::High => "HIGH",
        re_records::Severity::Critical => "CRITICAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use re_records::{AuthorityLevel, FixedClock, MatchPredicate, Rule, SeededIdSource, Severity};
    use uuid::Uuid;

    fn bundle(rules: Vec<Rule>) -> PolicyBundle {
        PolicyBundle {
            bundle_id: "B1".into(),
            bundle_version: "1".into(),
            authority_scope: vec!["isolate".into()],
            created_by: "ops".into(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            rules,
            bundle_key_id: None,
            bundle_signature: None,
        }
    }

    fn alert() -> Alert {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        Alert::new("I1", "R-ISO", Severity::High, 80.0, None, &mut ids, &clock).unwrap()
    }

    #[test]
    fn replay_reproduces_original_decision_bytes() {
        let rule = Rule {
            rule_id: "R-ISO".into(),
            priority: 10,
            match_predicates: vec![MatchPredicate {
                field: "policy_rule_id".into(),
                equals: "R-ISO".into(),
            }],
            allowed_actions: vec!["isolate".into()],
            required_authority: AuthorityLevel::None,
            explanation_template_id: "tmpl-iso".into(),
        };
        let b = bundle(vec![rule]);
        let a = alert();

        let original = RoutingDecision {
            decision_id: "d-1".into(),
            alert_id: a.alert_id.clone(),
            rule_id: "R-ISO".into(),
            routing_action: RoutingAction::new("isolate"),
            required_authority: AuthorityLevel::None,
            explanation_reference: ExplanationReference {
                explanation_template_id: "tmpl-iso".into(),
                explanation_bundle_id: "B1".into(),
            },
            decision_timestamp: "2026-01-01T00:00:00.000Z".into(),
            ledger_entry_id: Some("le-9".into()),
        };

        let replayed = replay_routing_decision(&b, &a, "d-1".into(), "2026-01-01T00:00:00.000Z".into());
        assert_eq!(
            replayed.canonical_for_comparison().unwrap(),
            original.canonical_for_comparison().unwrap()
        );
    }

    #[test]
    fn replay_detects_mismatch_when_bundle_changed() {
        let a = alert();
        let original = RoutingDecision {
            decision_id: "d-1".into(),
            alert_id: a.alert_id.clone(),
            rule_id: "R-ISO".into(),
            routing_action: RoutingAction::new("isolate"),
            required_authority: AuthorityLevel::None,
            explanation_reference: ExplanationReference {
                explanation_template_id: "tmpl-iso".into(),
                explanation_bundle_id: "B1".into(),
            },
            decision_timestamp: "2026-01-01T00:00:00.000Z".into(),
            ledger_entry_id: None,
        };

        let empty_bundle = bundle(vec![]);
        let replayed = replay_routing_decision(&empty_bundle, &a, "d-1".into(), "2026-01-01T00:00:00.000Z".into());
        assert_ne!(
            replayed.canonical_for_comparison().unwrap(),
            original.canonical_for_comparison().unwrap()
        );
    }
}
