//! AuthorityAssertion record (`SPEC_FULL.md` §3 supplement). Grounded on
//! `human-authority/crypto/signer.py`, `human-authority/cli/verify_override.py`.

use std::collections::BTreeSet;

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::factory::{Clock, IdSource};
use crate::policy::AuthorityLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityAssertion {
    pub assertion_id: String,
    pub authority_level: AuthorityLevel,
    pub asserted_by: String,
    pub incident_id: String,
    pub justification: String,
    pub asserted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_signature: Option<String>,
}

const SIGNATURE_EXCLUDED: &[&str] = &["assertion_key_id", "assertion_signature"];

impl AuthorityAssertion {
    /// Build, then sign, a fresh human-authority override — grounded on
    /// `human-authority/crypto/signer.py`'s `sign_action`: the assertion is
    /// never meaningful unsigned, so signing happens inline rather than as a
    /// separate caller step.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        authority_level: AuthorityLevel,
        asserted_by: impl Into<String>,
        incident_id: impl Into<String>,
        justification: impl Into<String>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
        signing_key: &SigningKey,
        signing_key_id: impl Into<String>,
    ) -> Result<Self> {
        let asserted_by = asserted_by.into();
        if asserted_by.is_empty() {
            return Err(RecordError::MissingField { field: "asserted_by" });
        }
        let incident_id = incident_id.into();
        if incident_id.is_empty() {
            return Err(RecordError::MissingField { field: "incident_id" });
        }
        let justification = justification.into();
        if justification.is_empty() {
            return Err(RecordError::MissingField {
                field: "justification",
            });
        }
        let mut assertion = AuthorityAssertion {
            assertion_id: ids.next_id().to_string(),
            authority_level,
            asserted_by,
            incident_id,
            justification,
            asserted_at: clock.now_rfc3339(),
            assertion_key_id: None,
            assertion_signature: None,
        };
        let bytes = assertion.bytes_for_signing()?;
        assertion.assertion_signature = Some(re_crypto::sign_canonical(signing_key, &bytes));
        assertion.assertion_key_id = Some(signing_key_id.into());
        Ok(assertion)
    }

    pub fn bytes_for_signing(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = SIGNATURE_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }

    /// Whether this assertion authorizes `required_authority` for
    /// `incident_id` — matching level exactly (no implicit ordering between
    /// authority levels, the spec defines them as an enumerated set).
    pub fn authorizes(&self, incident_id: &str, required_authority: AuthorityLevel) -> bool {
        self.incident_id == incident_id && self.authority_level == required_authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{FixedClock, SeededIdSource};
    use rand::rngs::OsRng;
    use uuid::Uuid;

    fn ids() -> SeededIdSource {
        SeededIdSource::new([Uuid::nil()])
    }

    fn clock() -> FixedClock {
        FixedClock("2026-01-01T00:00:00.000Z".into())
    }

    #[test]
    fn rejects_empty_justification() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let err = AuthorityAssertion::new(
            AuthorityLevel::Supervisor,
            "alice",
            "I1",
            "",
            &mut ids(),
            &clock(),
            &signing_key,
            "key-1",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::MissingField {
                field: "justification"
            }
        ));
    }

    #[test]
    fn builds_a_signed_assertion_that_authorizes_its_incident() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = signing_key.verifying_key();
        let assertion = AuthorityAssertion::new(
            AuthorityLevel::Supervisor,
            "alice",
            "I1",
            "approved via incident bridge call",
            &mut ids(),
            &clock(),
            &signing_key,
            "key-1",
        )
        .unwrap();

        assert!(assertion.authorizes("I1", AuthorityLevel::Supervisor));
        assert!(!assertion.authorizes("I2", AuthorityLevel::Supervisor));

        let bytes = assertion.bytes_for_signing().unwrap();
        re_crypto::verify_canonical(
            &public_key,
            &bytes,
            assertion.assertion_signature.as_deref().unwrap(),
        )
        .unwrap();
    }
}
