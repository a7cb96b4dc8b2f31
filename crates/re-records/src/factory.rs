//! Caller-provided id and clock sources for `RecordFactory` (`spec.md` §4.5
//! steps 1-2: "from a caller-provided source" / "from a caller-provided
//! clock"), so tests can seed deterministic ids and timestamps.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

pub trait IdSource {
    fn next_id(&mut self) -> Uuid;
}

pub trait Clock {
    /// RFC 3339 in UTC with a trailing `Z` (`spec.md` §4.5 step 2).
    fn now_rfc3339(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Deterministic id source for tests and replay: yields ids from a
/// pre-seeded list in order, then panics if exhausted (a replay driver
/// always knows exactly how many ids it needs).
#[derive(Debug, Clone)]
pub struct SeededIdSource {
    ids: std::collections::VecDeque<Uuid>,
}

impl SeededIdSource {
    pub fn new(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl IdSource for SeededIdSource {
    fn next_id(&mut self) -> Uuid {
        self.ids
            .pop_front()
            .expect("SeededIdSource exhausted before all ids were consumed")
    }
}

/// Deterministic clock for tests and replay: returns a fixed timestamp.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now_rfc3339(&self) -> String {
        self.0.clone()
    }
}
