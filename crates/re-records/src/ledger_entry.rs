//! LedgerEntry record: `spec.md` §3. `prev_entry_hash` links to the prior
//! entry's canonical bytes *minus its signature field*; `seq` is strictly
//! monotonic from 0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::factory::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Alert,
    HostEvent,
    ProcessEvent,
    RoutingDecision,
    Suppression,
    Command,
    DeliveryFailure,
    DeliveryTimeout,
    RollbackArtifact,
    ForensicArtifact,
    UbaBaseline,
    UbaDelta,
    UbaSignal,
    InteractionRecord,
    RiskScore,
    PlaybookExecution,
    AuthorityAssertion,
    SignedReport,
    VerificationFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: String,
    pub seq: u64,
    pub prev_entry_hash: String,
    pub record_kind: RecordKind,
    /// Hash of the referenced domain record (the ledger never stores the
    /// record itself, only its content hash — `spec.md` §3 ownership note).
    pub record_ref: String,
    pub timestamp: String,
    pub signer_key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

const SIGNATURE_EXCLUDED: &[&str] = &["signature"];

impl LedgerEntry {
    /// Canonical bytes of this entry with its signature excluded — the
    /// exact input to both `sha256(canonical(entry minus signature))` (used
    /// as the next entry's `prev_entry_hash`) and to signing itself.
    pub fn bytes_for_signing_or_linking(&self) -> Result<Vec<u8>> {
        let excluded: BTreeSet<&str> = SIGNATURE_EXCLUDED.iter().copied().collect();
        Ok(re_canon::canonical_bytes(self, &excluded)?)
    }

    /// Build the unsigned fields of the next entry in the chain. The caller
    /// signs `bytes_for_signing_or_linking()` and attaches the signature
    /// separately (`AuditLedger::append_entry` does this).
    pub fn next_unsigned(
        prev: Option<&LedgerEntry>,
        record_kind: RecordKind,
        record_ref: impl Into<String>,
        signer_key_id: impl Into<String>,
        entry_id: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<LedgerEntry> {
        let record_ref = record_ref.into();
        if record_ref.is_empty() {
            return Err(RecordError::MissingField { field: "record_ref" });
        }
        let (seq, prev_entry_hash) = match prev {
            Some(p) => (
                p.seq + 1,
                re_canon::sha256_hex_bytes(&p.bytes_for_signing_or_linking()?),
            ),
            None => (0, re_canon::zero_hash()),
        };
        Ok(LedgerEntry {
            entry_id: entry_id.into(),
            seq,
            prev_entry_hash,
            record_kind,
            record_ref,
            timestamp: clock.now_rfc3339(),
            signer_key_id: signer_key_id.into(),
            signature: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FixedClock;

    #[test]
    fn genesis_entry_has_zero_prev_hash_and_seq_zero() {
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let entry = LedgerEntry::next_unsigned(
            None,
            RecordKind::Alert,
            "deadbeef",
            "key-1",
            "e0",
            &clock,
        )
        .unwrap();
        assert_eq!(entry.seq, 0);
        assert_eq!(entry.prev_entry_hash, re_canon::zero_hash());
    }

    #[test]
    fn chains_off_prior_entry_bytes_minus_signature() {
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let mut first = LedgerEntry::next_unsigned(
            None,
            RecordKind::Alert,
            "deadbeef",
            "key-1",
            "e0",
            &clock,
        )
        .unwrap();
        first.signature = Some("sig-that-must-not-affect-linking".to_string());

        let second =
            LedgerEntry::next_unsigned(Some(&first), RecordKind::RoutingDecision, "cafebabe", "key-1", "e1", &clock)
                .unwrap();
        assert_eq!(second.seq, 1);

        let expected = re_canon::sha256_hex_bytes(&first.bytes_for_signing_or_linking().unwrap());
        assert_eq!(second.prev_entry_hash, expected);

        // Changing the signature alone must not change the link hash.
        let mut first_other_sig = first.clone();
        first_other_sig.signature = Some("different-signature".to_string());
        assert_eq!(
            re_canon::sha256_hex_bytes(&first_other_sig.bytes_for_signing_or_linking().unwrap()),
            expected
        );
    }
}
