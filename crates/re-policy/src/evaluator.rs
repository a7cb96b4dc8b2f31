//! RuleEvaluator: `spec.md` §4.8. Pure function over an alert and a
//! priority-sorted rule list — no shared mutable state, safe to call from
//! many workers in parallel.

use re_records::{Alert, MatchPredicate, Rule, Severity};

/// First rule (in `rules_by_descending_priority` order) whose predicates
/// all hold against `alert`. `spec.md` §4.8: "ties impossible by invariant"
/// (rule-priority uniqueness is enforced at bundle load time).
pub fn first_matching_rule<'a>(rules_by_descending_priority: &[&'a Rule], alert: &Alert) -> Option<&'a Rule> {
    rules_by_descending_priority
        .iter()
        .find(|rule| all_predicates_match(rule, alert))
        .copied()
}

fn all_predicates_match(rule: &Rule, alert: &Alert) -> bool {
    rule.match_predicates
        .iter()
        .all(|predicate| predicate_matches(predicate, alert))
}

fn predicate_matches(predicate: &MatchPredicate, alert: &Alert) -> bool {
    match alert_field_value(alert, &predicate.field) {
        Some(value) => value == predicate.equals,
        None => false,
    }
}

/// Predicates operate on alert fields only (`spec.md` §4.8).
fn alert_field_value(alert: &Alert, field: &str) -> Option<String> {
    match field {
        "incident_id" => Some(alert.incident_id.clone()),
        "policy_rule_id" => Some(alert.policy_rule_id.clone()),
        "severity" => Some(severity_as_str(alert.severity).to_string()),
        _ => None,
    }
}

fn severity_as_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "LOW",
        Severity::Medium => "MEDIUM",
        Severity::High => "HIGH",
        Severity::Critical => "CRITICAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use re_records::{AuthorityLevel, FixedClock, SeededIdSource};
    use uuid::Uuid;

    fn alert() -> Alert {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        Alert::new("I1", "R-ISO", Severity::High, 80.0, None, &mut ids, &clock).unwrap()
    }

    fn rule(id: &str, priority: u32, predicates: Vec<MatchPredicate>) -> Rule {
        Rule {
            rule_id: id.to_string(),
            priority,
            match_predicates: predicates,
            allowed_actions: vec!["isolate".to_string()],
            required_authority: AuthorityLevel::None,
            explanation_template_id: "tmpl-1".to_string(),
        }
    }

    #[test]
    fn matches_rule_on_severity_predicate() {
        let a = alert();
        let r = rule(
            "r1",
            10,
            vec![MatchPredicate {
                field: "severity".into(),
                equals: "HIGH".into(),
            }],
        );
        let rules = vec![&r];
        assert_eq!(first_matching_rule(&rules, &a).unwrap().rule_id, "r1");
    }

    #[test]
    fn no_match_when_predicate_fails() {
        let a = alert();
        let r = rule(
            "r1",
            10,
            vec![MatchPredicate {
                field: "severity".into(),
                equals: "LOW".into(),
            }],
        );
        let rules = vec![&r];
        assert!(first_matching_rule(&rules, &a).is_none());
    }

    #[test]
    fn first_match_wins_in_descending_priority_order() {
        let a = alert();
        let low_priority = rule("r-low", 5, vec![]);
        let high_priority = rule("r-high", 50, vec![]);
        // Caller is expected to pass rules already sorted descending.
        let rules = vec![&high_priority, &low_priority];
        assert_eq!(first_matching_rule(&rules, &a).unwrap().rule_id, "r-high");
    }
}
