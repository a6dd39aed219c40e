//! Notice Watch Coordination Library
//!
//! The deterministic half of the notice watcher. Nothing in here touches
//! the network:
//!
//! - `notice`: notice identities, change detection, and the dedup baseline
//! - `escalation`: the two-slot error ledger and the alert/resolution
//!   state machine that runs over it
//! - `state`: JSON snapshot persistence for both documents
//!
//! The agent crate drives one poll cycle at a time and feeds each outcome
//! through these types.

#![allow(clippy::uninlined_format_args)]

pub mod escalation;
pub mod notice;
pub mod state;

// Re-export key escalation types
pub use escalation::{
    Alert, ErrorCategory, ErrorLedger, ErrorRecord, EscalationConfig, EscalationEngine,
    Resolution, StreakSummary,
};

// Re-export key notice types
pub use notice::{content_fingerprint, ChangeDetector, ChangeSet, Notice, NoticeStore};

// Re-export key state types
pub use state::{SnapshotFile, StateError, StateResult};
