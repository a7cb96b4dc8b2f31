//! RollbackArtifact record: `spec.md` §3. `rollback_token` is the content
//! hash of the artifact *without* the executor's later-attached
//! `execution_result`, so the token can be computed before the executor
//! runs and re-verified after.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackType {
    NetworkIsolation,
    FileQuarantine,
    ProcessTermination,
    AccessRevocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackArtifact {
    pub rollback_type: RollbackType,
    pub original_state_snapshot: Value,
    pub command_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_token: Option<String>,
}

const TOKEN_EXCLUDED: &[&str] = &["execution_result", "rollback_token"];

impl RollbackArtifact {
    /// `rollback_token = SHA256(canonical(artifact minus execution_result))`
    /// (`spec.md` §4.5 kind-specific policy for RollbackArtifact).
    pub fn compute_rollback_token(&self) -> Result<String> {
        let excluded: BTreeSet<&str> = TOKEN_EXCLUDED.iter().copied().collect();
        Ok(re_canon::sha256_of_canonical(self, &excluded)?)
    }

    pub fn sealed(
        rollback_type: RollbackType,
        original_state_snapshot: Value,
        command_id: impl Into<String>,
    ) -> Result<Self> {
        let mut artifact = RollbackArtifact {
            rollback_type,
            original_state_snapshot,
            command_id: command_id.into(),
            execution_result: None,
            rollback_token: None,
        };
        artifact.rollback_token = Some(artifact.compute_rollback_token()?);
        Ok(artifact)
    }

    /// Attach the executor's result after the fact, without disturbing the
    /// already-minted token.
    pub fn with_execution_result(mut self, result: Value) -> Self {
        self.execution_result = Some(result);
        self
    }
}
