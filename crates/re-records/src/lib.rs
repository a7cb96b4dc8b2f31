//! Canonical record types for the trust spine: every struct here is a
//! record kind that can be wrapped in a [`ledger_entry::LedgerEntry`] and
//! appended to the audit ledger.

pub mod alert;
pub mod authority;
pub mod command;
pub mod error;
pub mod factory;
pub mod forensic;
pub mod host_event;
pub mod interaction;
pub mod ledger_entry;
pub mod playbook;
pub mod policy;
pub mod process_event;
pub mod report;
pub mod risk;
pub mod rollback;
pub mod routing;
pub mod suppression;
pub mod uba;

pub use alert::{Alert, Severity};
pub use authority::AuthorityAssertion;
pub use command::{CommandPayload, SignedCommand};
pub use error::{RecordError, Result};
pub use factory::{Clock, FixedClock, IdSource, RandomIdSource, SeededIdSource, SystemClock};
pub use forensic::ForensicArtifact;
pub use host_event::{HostEvent, HostEventType};
pub use interaction::InteractionRecord;
pub use ledger_entry::{LedgerEntry, RecordKind};
pub use playbook::{PlaybookExecution, PlaybookStep};
pub use policy::{AuthorityLevel, MatchPredicate, PolicyBundle, Rule};
pub use process_event::{ProcessEvent, ProcessEventType};
pub use report::{ReportKind, SignedReport};
pub use risk::{RiskScore, SeverityBand};
pub use rollback::{RollbackArtifact, RollbackType};
pub use routing::{ExplanationReference, RoutingAction, RoutingDecision};
pub use suppression::{Suppression, SuppressionReason};
pub use uba::{Baseline, ContextRefs, Delta, DeltaType, ObservedFeatures, Signal, Window};
