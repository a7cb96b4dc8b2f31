//! Domain-record existence and integrity lookup for the validator's
//! integrity checks (`spec.md` §4.10 step 2): "for each entry's record_ref,
//! the referenced domain record exists; recomputed immutable_hash matches
//! the recorded one."

use std::collections::{HashMap, HashSet};

use re_records::RecordKind;

/// Abstracts over however the caller's domain stores are laid out — the
/// validator only needs a yes/no/tampered answer per `(record_kind,
/// record_ref)` pair.
pub trait DomainLookup {
    /// `Some(true)` — found, and the record's recomputed hash still matches
    /// `record_ref`. `Some(false)` — found, but the recomputed hash no
    /// longer matches (content tampered after storage). `None` — no record
    /// with this reference exists in the domain store for `record_kind`.
    fn verify(&self, record_kind: RecordKind, record_ref: &str) -> Option<bool>;
}

/// A pre-built index: maps `(record_kind, hash-at-storage-time)` to whether
/// the record's hash still recomputes to the same value. Callers build this
/// once per validation run by reading their domain stores and recomputing
/// each record's `immutable_hash` (or the kind-specific canonical hash for
/// kinds that don't carry one, e.g. `RoutingDecision`).
#[derive(Debug, Default, Clone)]
pub struct HashDomainIndex {
    present: HashSet<(RecordKind, String)>,
    tampered: HashMap<(RecordKind, String), bool>,
}

impl HashDomainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a domain entry found at hash `stored_hash`; `matches_now`
    /// indicates whether recomputing the hash from current content still
    /// yields `stored_hash`.
    pub fn insert(&mut self, record_kind: RecordKind, stored_hash: impl Into<String>, matches_now: bool) {
        let key = (record_kind, stored_hash.into());
        self.present.insert(key.clone());
        self.tampered.insert(key, matches_now);
    }
}

impl DomainLookup for HashDomainIndex {
    fn verify(&self, record_kind: RecordKind, record_ref: &str) -> Option<bool> {
        let key = (record_kind, record_ref.to_string());
        if !self.present.contains(&key) {
            return None;
        }
        self.tampered.get(&key).copied()
    }
}
