//! PolicyBundle & Rule records: `spec.md` §3. Grounded on
//! `alert-policy/crypto/bundle_signer.py`/`bundle_verifier.py` for the
//! signature-exclusion field set.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorityLevel {
    None,
    Supervisor,
    IncidentCommander,
    Executive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub priority: u32,
    pub match_predicates: Vec<MatchPredicate>,
    pub allowed_actions: Vec<String>,
    pub required_authority: AuthorityLevel,
    pub explanation_template_id: String,
}

/// A single field-equality predicate over alert fields. `spec.md` §4.8:
/// "Predicates operate on alert fields only; evaluation is pure."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPredicate {
    pub field: String,
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyBundle {
    pub bundle_id: String,
    pub bundle_version: String,
    pub authority_scope: Vec<String>,
    pub created_by: String,
    pub created_at: String,
    pub rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_signature: Option<String>,
}

const SIGNATURE_EXCLUDED: &[&str] = &["bundle_key_id", "bundle_signature"];

impl PolicyBundle {
    /// Canonical bytes with signature fields excluded — the exact input to
    /// both signing and verification (`spec.md` §3 PolicyBundle invariant).
    pub fn bytes_for_signing(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = SIGNATURE_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }

    /// `spec.md` §3: "rule `priority` values are unique".
    pub fn validate_priority_uniqueness(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.priority) {
                return Err(RecordError::Referential(format!(
                    "duplicate rule priority {} (rule {})",
                    rule.priority, rule.rule_id
                )));
            }
        }
        Ok(())
    }

    /// Rules sorted by descending priority, the order `RuleEvaluator`
    /// consumes (`spec.md` §4.8).
    pub fn rules_by_descending_priority(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        rules
    }
}
