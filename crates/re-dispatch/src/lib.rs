//! CommandDispatcher: `spec.md` §4.9, + the `AuthorityAssertion` check from
//! `SPEC_FULL.md` §4.9. Grounded on `notification-engine/engine/dispatcher.py`
//! (best-effort, no implicit retry) and
//! `notification-engine/engine/target_resolver.py` (read-only target
//! resolution).

pub mod error;

use std::collections::BTreeSet;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use serde_json::Value;

use re_ledger::AuditLedger;
use re_records::{
    AuthorityAssertion, AuthorityLevel, Clock, CommandPayload, IdSource, LedgerEntry, RecordKind,
    RollbackArtifact, RollbackType, RoutingDecision, SignedCommand,
};
use re_store::AppendOnlyStore;

pub use error::{DispatchError, Result};

/// Resolves a delivery target from a read-only store keyed by incident.
pub trait TargetResolver {
    fn resolve(&self, incident_id: &str) -> Option<String>;
}

/// In-memory target resolver for tests and simple deployments; production
/// resolvers back this with a read-only domain store.
#[derive(Debug, Default, Clone)]
pub struct StaticTargetResolver(std::collections::HashMap<String, String>);

impl StaticTargetResolver {
    pub fn new(targets: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(targets.into_iter().collect())
    }
}

impl TargetResolver for StaticTargetResolver {
    fn resolve(&self, incident_id: &str) -> Option<String> {
        self.0.get(incident_id).cloned()
    }
}

/// What the external executor (out of scope, opaque per `spec.md` §1)
/// reported back for one command.
pub enum ExecutorOutcome {
    Delivered { original_state_snapshot: Value },
    Failed(String),
    TimedOut,
}

/// The out-of-scope effector boundary: receives a signed command and a
/// caller-supplied deadline, returns a delivery outcome. Never retried
/// internally — `spec.md` §4.9: "retry is a separate, explicit call".
pub trait CommandExecutor {
    fn execute(&mut self, command: &SignedCommand, deadline: Duration) -> ExecutorOutcome;
}

pub struct DispatchOutcome {
    pub command: SignedCommand,
    pub command_ledger_entry: LedgerEntry,
    pub delivery_ledger_entry: Option<LedgerEntry>,
    pub rollback_artifact: Option<RollbackArtifact>,
    pub rollback_ledger_entry: Option<LedgerEntry>,
}

pub struct CommandDispatcher<R: TargetResolver, E: CommandExecutor> {
    signing_key: SigningKey,
    signing_key_id: String,
    targets: R,
    executor: E,
}

impl<R: TargetResolver, E: CommandExecutor> CommandDispatcher<R, E> {
    pub fn new(signing_key: SigningKey, signing_key_id: impl Into<String>, targets: R, executor: E) -> Self {
        Self {
            signing_key,
            signing_key_id: signing_key_id.into(),
            targets,
            executor,
        }
    }

    /// Build, sign, and persist a command for `routing_decision`, hand it to
    /// the executor, and record the outcome.
    ///
    /// When `routing_decision.required_authority != NONE`, a matching
    /// `AuthorityAssertion` must be supplied and must authorize this
    /// `incident_id`/authority level; otherwise this is a policy rejection,
    /// not a silent downgrade (`SPEC_FULL.md` §4.9).
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &mut self,
        routing_decision: &RoutingDecision,
        command_type: impl Into<String>,
        incident_id: impl Into<String>,
        policy_id: impl Into<String>,
        policy_version: impl Into<String>,
        issuing_authority: impl Into<String>,
        authority_assertion: Option<&AuthorityAssertion>,
        rollback_type: RollbackType,
        deadline: Duration,
        ids: &mut impl IdSource,
        clock: &impl Clock,
        commands_store: &mut AppendOnlyStore,
        rollback_store: &mut AppendOnlyStore,
        ledger: &mut AuditLedger,
    ) -> Result<DispatchOutcome> {
        let incident_id = incident_id.into();

        if routing_decision.required_authority != AuthorityLevel::None {
            let authorized = authority_assertion
                .map(|a| a.authorizes(&incident_id, routing_decision.required_authority))
                .unwrap_or(false);
            if !authorized {
                return Err(DispatchError::PolicyRejection {
                    reason: format!(
                        "command requires authority {:?} but no matching assertion was presented for incident {incident_id}",
                        routing_decision.required_authority
                    ),
                });
            }
        }

        let target = self.targets.resolve(&incident_id).ok_or_else(|| DispatchError::PolicyRejection {
            reason: format!("no delivery target resolved for incident {incident_id}"),
        })?;

        let command_id = ids.next_id().to_string();
        let payload = CommandPayload {
            command_id: command_id.clone(),
            command_type: command_type.into(),
            target,
            incident_id: incident_id.clone(),
            policy_id: policy_id.into(),
            policy_version: policy_version.into(),
            issuing_authority: issuing_authority.into(),
            timestamp: clock.now_rfc3339(),
        };
        payload.validate()?;

        let bytes = payload.bytes_for_signing()?;
        let signature = re_crypto::sign_canonical(&self.signing_key, &bytes);
        let signed_command = SignedCommand {
            payload,
            signature,
            signing_key_id: self.signing_key_id.clone(),
            signing_algorithm: re_records::command::SIGNING_ALGORITHM.to_string(),
            signed_at: clock.now_rfc3339(),
        };

        commands_store.append(&signed_command)?;
        let command_ref = re_canon::sha256_of_canonical(&signed_command, &BTreeSet::new())?;
        let command_ledger_entry = ledger.append_entry(
            RecordKind::Command,
            command_ref.clone(),
            &self.signing_key,
            self.signing_key_id.clone(),
            ids.next_id().to_string(),
            clock,
        )?;

        tracing::info!(command_id = %command_id, target = %signed_command.payload.target, "command dispatched to executor");
        let outcome = self.executor.execute(&signed_command, deadline);

        let (delivery_ledger_entry, rollback_artifact, rollback_ledger_entry) = match outcome {
            ExecutorOutcome::Delivered { original_state_snapshot } => {
                let artifact = RollbackArtifact::sealed(rollback_type, original_state_snapshot, command_id.clone())?;
                rollback_store.append(&artifact)?;
                let rollback_ref = artifact
                    .rollback_token
                    .clone()
                    .expect("RollbackArtifact::sealed always mints a token");
                let entry = ledger.append_entry(
                    RecordKind::RollbackArtifact,
                    rollback_ref,
                    &self.signing_key,
                    self.signing_key_id.clone(),
                    ids.next_id().to_string(),
                    clock,
                )?;
                (None, Some(artifact), Some(entry))
            }
            ExecutorOutcome::Failed(reason) => {
                tracing::warn!(command_id = %command_id, reason = %reason, "command delivery failed");
                let entry = ledger.append_entry(
                    RecordKind::DeliveryFailure,
                    command_ref.clone(),
                    &self.signing_key,
                    self.signing_key_id.clone(),
                    ids.next_id().to_string(),
                    clock,
                )?;
                (Some(entry), None, None)
            }
            ExecutorOutcome::TimedOut => {
                tracing::warn!(command_id = %command_id, "command delivery timed out");
                let entry = ledger.append_entry(
                    RecordKind::DeliveryTimeout,
                    command_ref.clone(),
                    &self.signing_key,
                    self.signing_key_id.clone(),
                    ids.next_id().to_string(),
                    clock,
                )?;
                (Some(entry), None, None)
            }
        };

        Ok(DispatchOutcome {
            command: signed_command,
            command_ledger_entry,
            delivery_ledger_entry,
            rollback_artifact,
            rollback_ledger_entry,
        })
    }
}
