//! ReplayEngine & Validator: `spec.md` §4.10. Grounded on
//! `orchestrator/engine/replay_engine.py` (load-all, sort, replay) and
//! `audit-ledger/cli/export_ledger.py` (range-scan over ledger entries).
//! Read-only: never writes into any domain store.

use re_crypto::KeyStore;
use re_ledger::AuditLedger;
use re_records::{Alert, PolicyBundle, RoutingDecision};

use crate::domain_lookup::DomainLookup;
use crate::error::Result;
use crate::replay_routing_decision;
use crate::report::{FailureKind, FirstFailure, ValidationReport};

/// A signed artifact whose custody (signature under its advertised key)
/// must be checked — a bundle, playbook, report, or command envelope
/// already reduced to its canonical-bytes-and-signature shape by the
/// caller (`spec.md` §4.10 step 3).
pub struct CustodyArtifact {
    pub label: String,
    pub key_id: String,
    pub canonical_bytes: Vec<u8>,
    pub signature: String,
}

/// One routing simulation input: the bundle and alert to replay against,
/// plus the originally-stored decision to compare byte-for-byte
/// (`spec.md` §4.10 step 5, §8: "up to the fresh decision_id and
/// decision_timestamp, which are supplied as inputs during replay").
pub struct RoutingSimulation<'a> {
    pub bundle: &'a PolicyBundle,
    pub alert: &'a Alert,
    pub stored_decision: &'a RoutingDecision,
}

pub struct Validator;

impl Validator {
    /// Run every check in `spec.md` §4.10's order, stopping at the first
    /// failure (the core "never swallows errors... live write paths fail
    /// fast on the first error" policy from §7, applied to the one
    /// validator run that aggregates checks).
    pub fn run(
        ledger: &AuditLedger,
        keystore: &KeyStore,
        domain_lookup: &dyn DomainLookup,
        custody_artifacts: &[CustodyArtifact],
        policy_bundles: &[PolicyBundle],
        routing_simulations: &[RoutingSimulation<'_>],
    ) -> Result<ValidationReport> {
        let (entries, _recovery) = ledger.read_all()?;
        let entries_checked = entries.len();

        if let Some(failure) = Self::ledger_checks(ledger, keystore)? {
            return Ok(ValidationReport::fail(entries_checked, failure));
        }
        if let Some(failure) = Self::integrity_checks(&entries, domain_lookup) {
            return Ok(ValidationReport::fail(entries_checked, failure));
        }
        if let Some(failure) = Self::custody_checks(keystore, custody_artifacts) {
            return Ok(ValidationReport::fail(entries_checked, failure));
        }
        if let Some(failure) = Self::config_checks(policy_bundles) {
            return Ok(ValidationReport::fail(entries_checked, failure));
        }
        if let Some(failure) = Self::simulation_checks(routing_simulations)? {
            return Ok(ValidationReport::fail(entries_checked, failure));
        }

        Ok(ValidationReport::pass(entries_checked))
    }

    fn ledger_checks(ledger: &AuditLedger, keystore: &KeyStore) -> Result<Option<FirstFailure>> {
        match ledger.verify_chain(keystore) {
            Ok(()) => Ok(None),
            Err(re_ledger::LedgerError::SeqMismatch { expected, actual }) => Ok(Some(FirstFailure {
                kind: FailureKind::LedgerSeqMismatch,
                location: format!("ledger seq {actual}"),
                detail: format!("expected seq {expected}, got {actual}"),
            })),
            Err(re_ledger::LedgerError::ChainBroken { seq, reason }) => Ok(Some(FirstFailure {
                kind: FailureKind::LedgerChainBroken,
                location: format!("ledger seq {seq}"),
                detail: reason,
            })),
            Err(other) => Err(other.into()),
        }
    }

    fn integrity_checks(
        entries: &[re_records::LedgerEntry],
        domain_lookup: &dyn DomainLookup,
    ) -> Option<FirstFailure> {
        for entry in entries {
            match domain_lookup.verify(entry.record_kind, &entry.record_ref) {
                Some(true) => continue,
                Some(false) => {
                    return Some(FirstFailure {
                        kind: FailureKind::ImmutableHashMismatch,
                        location: format!("ledger seq {}", entry.seq),
                        detail: format!(
                            "recomputed hash for record_ref {} no longer matches",
                            entry.record_ref
                        ),
                    })
                }
                None => {
                    return Some(FirstFailure {
                        kind: FailureKind::MissingDomainRecord,
                        location: format!("ledger seq {}", entry.seq),
                        detail: format!(
                            "record_ref {} not found in domain store for {:?}",
                            entry.record_ref, entry.record_kind
                        ),
                    })
                }
            }
        }
        None
    }

    fn custody_checks(keystore: &KeyStore, artifacts: &[CustodyArtifact]) -> Option<FirstFailure> {
        for artifact in artifacts {
            let public_key = match keystore.load_public(&artifact.key_id) {
                Ok(key) => key,
                Err(err) => {
                    return Some(FirstFailure {
                        kind: FailureKind::CustodySignatureInvalid,
                        location: artifact.label.clone(),
                        detail: err.to_string(),
                    })
                }
            };
            if let Err(err) =
                re_crypto::verify_canonical(&public_key, &artifact.canonical_bytes, &artifact.signature)
            {
                return Some(FirstFailure {
                    kind: FailureKind::CustodySignatureInvalid,
                    location: artifact.label.clone(),
                    detail: err.to_string(),
                });
            }
        }
        None
    }

    fn config_checks(bundles: &[PolicyBundle]) -> Option<FirstFailure> {
        for bundle in bundles {
            if let Err(err) = bundle.validate_priority_uniqueness() {
                return Some(FirstFailure {
                    kind: FailureKind::PolicyPriorityConflict,
                    location: format!("bundle {}", bundle.bundle_id),
                    detail: err.to_string(),
                });
            }
        }
        None
    }

    fn simulation_checks(simulations: &[RoutingSimulation<'_>]) -> Result<Option<FirstFailure>> {
        for sim in simulations {
            let replayed = replay_routing_decision(
                sim.bundle,
                sim.alert,
                sim.stored_decision.decision_id.clone(),
                sim.stored_decision.decision_timestamp.clone(),
            );
            let replayed_bytes = replayed.canonical_for_comparison()?;
            let stored_bytes = sim.stored_decision.canonical_for_comparison()?;
            if replayed_bytes != stored_bytes {
                return Ok(Some(FirstFailure {
                    kind: FailureKind::RoutingSimulationMismatch,
                    location: format!("alert {}", sim.alert.alert_id),
                    detail: "replayed routing decision differs from the stored decision".to_string(),
                }));
            }
        }
        Ok(None)
    }
}
