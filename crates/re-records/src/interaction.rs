//! InteractionRecord (`SPEC_FULL.md` §3 supplement). Grounded on
//! `deception/engine/interaction_collector.py`.

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};
use crate::factory::{Clock, IdSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub interaction_id: String,
    pub decoy_id: String,
    pub interaction_type: String,
    pub source_ip: String,
    pub observed_at: String,
    pub evidence_reference: String,
}

impl InteractionRecord {
    pub fn new(
        decoy_id: impl Into<String>,
        interaction_type: impl Into<String>,
        source_ip: impl Into<String>,
        evidence_reference: impl Into<String>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<Self> {
        let decoy_id = decoy_id.into();
        if decoy_id.is_empty() {
            return Err(RecordError::MissingField { field: "decoy_id" });
        }
        let interaction_type = interaction_type.into();
        if interaction_type.is_empty() {
            return Err(RecordError::MissingField {
                field: "interaction_type",
            });
        }
        Ok(InteractionRecord {
            interaction_id: ids.next_id().to_string(),
            decoy_id,
            interaction_type,
            source_ip: source_ip.into(),
            observed_at: clock.now_rfc3339(),
            evidence_reference: evidence_reference.into(),
        })
    }
}
