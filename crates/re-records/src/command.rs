//! Command envelope: `spec.md` §3, §6 signed command envelope. Grounded on
//! `decision_receipt.rs::sign_receipt` for the payload/signature split, and
//! `notification-engine/engine/dispatcher.py` for the field set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command_id: String,
    pub command_type: String,
    pub target: String,
    pub incident_id: String,
    pub policy_id: String,
    pub policy_version: String,
    pub issuing_authority: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCommand {
    pub payload: CommandPayload,
    pub signature: String,
    pub signing_key_id: String,
    pub signing_algorithm: String,
    pub signed_at: String,
}

impl CommandPayload {
    pub fn validate(&self) -> Result<()> {
        if self.command_type.is_empty() {
            return Err(RecordError::MissingField {
                field: "command_type",
            });
        }
        if self.target.is_empty() {
            return Err(RecordError::MissingField { field: "target" });
        }
        Ok(())
    }

    /// Canonical bytes of the payload — this is what gets signed, and what
    /// verification recomputes bytes over (no excluded fields: the payload
    /// itself carries no signature material).
    pub fn bytes_for_signing(&self) -> Result<Vec<u8>> {
        Ok(re_canon::canonical_bytes(self, &BTreeSet::new())?)
    }
}

pub const SIGNING_ALGORITHM: &str = "ed25519";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_target() {
        let payload = CommandPayload {
            command_id: "c1".into(),
            command_type: "isolate".into(),
            target: "".into(),
            incident_id: "I1".into(),
            policy_id: "B1".into(),
            policy_version: "1".into(),
            issuing_authority: "ops".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        };
        assert!(matches!(
            payload.validate(),
            Err(RecordError::MissingField { field: "target" })
        ));
    }
}
