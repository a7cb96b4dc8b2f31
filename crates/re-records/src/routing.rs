//! RoutingDecision record: `spec.md` §3. Grounded on
//! `alert-policy/engine/router.py`'s decision dict shape — in particular
//! `routing_action = allowed_actions[0]`, an unrestricted string
//! pass-through with no fixed vocabulary, which this type preserves instead
//! of collapsing into a closed enum.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::policy::AuthorityLevel;

/// The literal first entry of a matched rule's `allowed_actions` (or
/// `"notify"` for the explicit default), carried through verbatim —
/// `spec.md` §4.8 scenario 2 requires `allowed_actions: ["isolate"]` to
/// yield `routing_action: "isolate"`, not a generic bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingAction(pub String);

impl RoutingAction {
    pub const NOTIFY: &'static str = "notify";
    pub const ESCALATE: &'static str = "escalate";
    pub const ISOLATE: &'static str = "isolate";
    pub const SUPPRESS: &'static str = "suppress";

    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoutingAction {
    fn from(action: &str) -> Self {
        Self::new(action)
    }
}

impl PartialEq<str> for RoutingAction {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationReference {
    pub explanation_template_id: String,
    pub explanation_bundle_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub decision_id: String,
    pub alert_id: String,
    pub rule_id: String,
    pub routing_action: RoutingAction,
    pub required_authority: AuthorityLevel,
    pub explanation_reference: ExplanationReference,
    pub decision_timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_entry_id: Option<String>,
}

const HASH_EXCLUDED: &[&str] = &["ledger_entry_id"];

impl RoutingDecision {
    /// Canonical bytes excluding the derived, non-hashed `ledger_entry_id`
    /// field — the byte image that must be identical between the original
    /// decision and the validator's replayed decision (`spec.md` §8).
    pub fn canonical_for_comparison(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = HASH_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_entry_id_excluded_from_comparison_bytes() {
        let mut decision = RoutingDecision {
            decision_id: "d1".into(),
            alert_id: "a1".into(),
            rule_id: "r1".into(),
            routing_action: RoutingAction::new(RoutingAction::NOTIFY),
            required_authority: AuthorityLevel::None,
            explanation_reference: ExplanationReference {
                explanation_template_id: "t1".into(),
                explanation_bundle_id: "".into(),
            },
            decision_timestamp: "2026-01-01T00:00:00.000Z".into(),
            ledger_entry_id: None,
        };
        let before = decision.canonical_for_comparison().unwrap();
        decision.ledger_entry_id = Some("le-1".into());
        let after = decision.canonical_for_comparison().unwrap();
        assert_eq!(before, after);
    }
}
