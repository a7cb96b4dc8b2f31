//! Router: `spec.md` §4.8. Orchestrates current bundle → evaluator →
//! routing decision. Grounded on `alert-policy/engine/router.py`'s explicit
//! default-to-notify policy.

use std::sync::{Arc, RwLock};

use re_records::{
    Alert, Clock, ExplanationReference, IdSource, PolicyBundle, RoutingAction, RoutingDecision,
};

use crate::error::Result;
use crate::evaluator::first_matching_rule;

/// Template id used for the explicit default-to-notify decision when no
/// rule matches (`spec.md` §4.8: "Default policy (explicit, not implicit)").
pub const DEFAULT_EXPLANATION_TEMPLATE_ID: &str = "default-notify";

/// Stateless per call: the only shared state is the current bundle, held
/// behind a lock so concurrent readers see either the whole old or whole
/// new bundle, never a torn mix (`spec.md` §4.8, §5).
pub struct Router {
    current: RwLock<Arc<PolicyBundle>>,
}

impl Router {
    pub fn new(bundle: PolicyBundle) -> Self {
        Self {
            current: RwLock::new(Arc::new(bundle)),
        }
    }

    /// Atomically replace the active bundle. Callers should pass a bundle
    /// already verified by [`crate::BundleLoader`].
    pub fn swap_bundle(&self, bundle: PolicyBundle) {
        let mut guard = self.current.write().expect("router bundle lock poisoned");
        *guard = Arc::new(bundle);
    }

    pub fn current_bundle(&self) -> Arc<PolicyBundle> {
        self.current.read().expect("router bundle lock poisoned").clone()
    }

    /// Route a single alert against the current bundle. No retained state
    /// is mutated by this call beyond the returned decision.
    pub fn route_alert(
        &self,
        alert: &Alert,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<RoutingDecision> {
        let bundle = self.current_bundle();
        let rules = bundle.rules_by_descending_priority();

        let decision = match first_matching_rule(&rules, alert) {
            Some(rule) => {
                let action = parse_routing_action(&rule.allowed_actions);
                RoutingDecision {
                    decision_id: ids.next_id().to_string(),
                    alert_id: alert.alert_id.clone(),
                    rule_id: rule.rule_id.clone(),
                    routing_action: action,
                    required_authority: rule.required_authority,
                    explanation_reference: ExplanationReference {
                        explanation_template_id: rule.explanation_template_id.clone(),
                        explanation_bundle_id: bundle.bundle_id.clone(),
                    },
                    decision_timestamp: clock.now_rfc3339(),
                    ledger_entry_id: None,
                }
            }
            None => RoutingDecision {
                decision_id: ids.next_id().to_string(),
                alert_id: alert.alert_id.clone(),
                rule_id: String::new(),
                routing_action: RoutingAction::new(RoutingAction::NOTIFY),
                required_authority: re_records::AuthorityLevel::None,
                explanation_reference: ExplanationReference {
                    explanation_template_id: DEFAULT_EXPLANATION_TEMPLATE_ID.to_string(),
                    explanation_bundle_id: bundle.bundle_id.clone(),
                },
                decision_timestamp: clock.now_rfc3339(),
                ledger_entry_id: None,
            },
        };

        tracing::debug!(
            alert_id = %alert.alert_id,
            rule_id = %decision.rule_id,
            action = ?decision.routing_action,
            "alert routed"
        );
        Ok(decision)
    }
}

/// `routing_action = allowed_actions[0]`, verbatim — `alert-policy/engine/
/// router.py:83`. No fixed vocabulary is enforced here; a rule is free to
/// name any action string its downstream dispatcher understands.
fn parse_routing_action(allowed_actions: &[String]) -> RoutingAction {
    RoutingAction::new(
        allowed_actions
            .first()
            .map(String::as_str)
            .unwrap_or(RoutingAction::NOTIFY),
    )
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
    fn default_to_notify_when_no_rule_matches() {
        let router = Router::new(bundle(vec![]));
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let decision = router.route_alert(&alert(), &mut ids, &clock).unwrap();
        assert_eq!(decision.routing_action, RoutingAction::new("notify"));
        assert_eq!(decision.required_authority, AuthorityLevel::None);
        assert!(decision.rule_id.is_empty());
    }

    #[test]
    fn matching_rule_produces_isolate_routing_action() {
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
        let router = Router::new(bundle(vec![rule]));
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let decision = router.route_alert(&alert(), &mut ids, &clock).unwrap();
        assert_eq!(decision.routing_action, RoutingAction::new("isolate"));
        assert_eq!(decision.rule_id, "R-ISO");
    }

    #[test]
    fn swap_bundle_is_observed_whole_by_subsequent_calls() {
        let router = Router::new(bundle(vec![]));
        let rule = Rule {
            rule_id: "R-NEW".into(),
            priority: 10,
            match_predicates: vec![],
            allowed_actions: vec!["escalate".into()],
            required_authority: AuthorityLevel::None,
            explanation_template_id: "tmpl-new".into(),
        };
        router.swap_bundle(bundle(vec![rule]));
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let decision = router.route_alert(&alert(), &mut ids, &clock).unwrap();
        assert_eq!(decision.routing_action, RoutingAction::new("escalate"));
    }
}
