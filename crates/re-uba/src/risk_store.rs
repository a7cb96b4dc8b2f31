//! RiskScore storage: `SPEC_FULL.md` §4.12. Grounded on
//! `risk-index/storage/risk_store.py`'s append/read-all/latest/range access
//! pattern atop the JSONL append-only format.

use std::path::PathBuf;

use re_records::RiskScore;
use re_store::{AppendOnlyStore, OpenMode};

use crate::error::Result;

/// Thin domain-specific wrapper over [`AppendOnlyStore`] for risk scores,
/// adding a `latest` accessor the generic store doesn't need to know about.
pub struct RiskScoreStore {
    store: AppendOnlyStore,
}

impl RiskScoreStore {
    pub fn open(path: impl Into<PathBuf>, mode: OpenMode) -> Result<Self> {
        Ok(Self {
            store: AppendOnlyStore::open(path, mode)?,
        })
    }

    pub fn append(&mut self, score: &RiskScore) -> Result<()> {
        self.store.append(score)?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<RiskScore>> {
        let (scores, _report) = self.store.read_all::<RiskScore>()?;
        Ok(scores)
    }

    /// Most recently appended score, if any.
    pub fn latest(&self) -> Result<Option<RiskScore>> {
        Ok(self.read_all()?.into_iter().last())
    }

    pub fn range(&self, start: usize, end: usize) -> Result<Vec<RiskScore>> {
        Ok(self.store.range::<RiskScore>(start, end)?)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.store.count()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{Normalizer, RiskComponent};
    use re_records::{FixedClock, SeededIdSource};
    use uuid::Uuid;

    #[test]
    fn appended_scores_round_trip_and_latest_is_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.jsonl");
        let mut store = RiskScoreStore::open(&path, OpenMode::ReadWrite).unwrap();

        let mut ids = SeededIdSource::new([Uuid::nil(), Uuid::from_u128(1)]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let components = vec![RiskComponent {
            name: "uba".into(),
            raw_value: 40.0,
            confidence: 0.8,
        }];

        let first = Normalizer::normalize("alice", &components, 1.0, &mut ids, &clock).unwrap();
        store.append(&first).unwrap();
        let second_components = vec![RiskComponent {
            name: "uba".into(),
            raw_value: 90.0,
            confidence: 0.9,
        }];
        let second = Normalizer::normalize("alice", &second_components, 1.0, &mut ids, &clock).unwrap();
        store.append(&second).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.score_id, second.score_id);
    }
}
