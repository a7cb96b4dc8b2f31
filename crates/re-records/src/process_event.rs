//! ProcessEvent record (`SPEC_FULL.md` §3 supplement). Grounded on
//! `hnmp/engine/process_normalizer.py`: facts-only process lifecycle facts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RecordError, Result};
use crate::factory::{Clock, IdSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessEventType {
    ProcessStart,
    ProcessExit,
    ModuleLoad,
    NetworkConnect,
    FileHandleOpen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEvent {
    pub event_id: String,
    pub event_type: ProcessEventType,
    pub host_id: String,
    pub process_id: String,
    pub parent_process_id: String,
    pub timestamp: String,
    pub event_data: Value,
    pub source_agent: String,
    pub immutable_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_entry_id: Option<String>,
}

const HASH_EXCLUDED: &[&str] = &["immutable_hash", "ledger_entry_id"];

impl ProcessEvent {
    pub fn new(
        event_type: ProcessEventType,
        host_id: impl Into<String>,
        process_id: impl Into<String>,
        parent_process_id: impl Into<String>,
        event_data: Value,
        source_agent: impl Into<String>,
        ids: &mut impl IdSource,
        clock: &impl Clock,
    ) -> Result<Self> {
        let process_id = process_id.into();
        if process_id.is_empty() {
            return Err(RecordError::MissingField { field: "process_id" });
        }
        let mut event = ProcessEvent {
            event_id: ids.next_id().to_string(),
            event_type,
            host_id: host_id.into(),
            process_id,
            parent_process_id: parent_process_id.into(),
            timestamp: clock.now_rfc3339(),
            event_data,
            source_agent: source_agent.into(),
            immutable_hash: String::new(),
            ledger_entry_id: None,
        };
        let excluded: BTreeSet<&str> = HASH_EXCLUDED.iter().copied().collect();
        event.immutable_hash = re_canon::sha256_of_canonical(&event, &excluded)?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{FixedClock, SeededIdSource};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn rejects_empty_process_id() {
        let mut ids = SeededIdSource::new([Uuid::nil()]);
        let clock = FixedClock("2026-01-01T00:00:00.000Z".into());
        let err = ProcessEvent::new(
            ProcessEventType::ProcessStart,
            "host-1",
            "",
            "0",
            json!({}),
            "linux-agent",
            &mut ids,
            &clock,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::MissingField { field: "process_id" }
        ));
    }
}
