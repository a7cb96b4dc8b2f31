//! PlaybookExecution record (`SPEC_FULL.md` §3 supplement). Grounded on
//! `incident-response/cli/register_playbook.py`,
//! `incident-response/crypto/playbook_signer.py`.

use std::collections::BTreeSet;

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::factory::Clock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookStep {
    pub step_id: String,
    pub command_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookExecution {
    pub playbook_id: String,
    pub playbook_version: String,
    pub incident_id: String,
    pub steps: Vec<PlaybookStep>,
    pub executed_by: String,
    pub executed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playbook_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playbook_signature: Option<String>,
}

const SIGNATURE_EXCLUDED: &[&str] = &["playbook_key_id", "playbook_signature"];

impl PlaybookExecution {
    /// Build, then sign, an execution record for a caller-supplied playbook.
    /// `playbook_id` names a pre-registered playbook — it is not freshly
    /// generated here, matching `register_playbook.py`'s caller-supplied
    /// playbook identity. Signs with `signing_key` immediately, since an
    /// unsigned `PlaybookExecution` has no meaning on the ledger.
    pub fn new(
        playbook_id: impl Into<String>,
        playbook_version: impl Into<String>,
        incident_id: impl Into<String>,
        steps: Vec<PlaybookStep>,
        executed_by: impl Into<String>,
        clock: &impl Clock,
        signing_key: &SigningKey,
        signing_key_id: impl Into<String>,
    ) -> Result<Self> {
        let playbook_id = playbook_id.into();
        if playbook_id.is_empty() {
            return Err(RecordError::MissingField { field: "playbook_id" });
        }
        let executed_by = executed_by.into();
        if executed_by.is_empty() {
            return Err(RecordError::MissingField { field: "executed_by" });
        }
        let mut execution = PlaybookExecution {
            playbook_id,
            playbook_version: playbook_version.into(),
            incident_id: incident_id.into(),
            steps,
            executed_by,
            executed_at: clock.now_rfc3339(),
            playbook_key_id: None,
            playbook_signature: None,
        };
        let bytes = execution.bytes_for_signing()?;
        execution.playbook_signature = Some(re_crypto::sign_canonical(signing_key, &bytes));
        execution.playbook_key_id = Some(signing_key_id.into());
        Ok(execution)
    }

    pub fn bytes_for_signing(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = SIGNATURE_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }
}
