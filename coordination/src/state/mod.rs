//! State persistence for the watcher
//!
//! Two logical documents survive between invocations:
//!
//! - the notice store (`NoticeStore`): dedup baseline + last check time
//! - the error ledger (`ErrorLedger`): current and shadow failure streaks
//!
//! Both are pretty-printed JSON. Reads never fail the cycle (a missing or
//! corrupt file reads as the empty document). Writes happen once, at the
//! end of a cycle, through an atomic rename.
//!
//! # Usage
//!
//! ```ignore
//! use coordination::state::SnapshotFile;
//! use coordination::escalation::ErrorLedger;
//!
//! let file: SnapshotFile<ErrorLedger> = SnapshotFile::new("error_state.json");
//! let mut ledger = file.load_or_default();
//! // ... run the cycle ...
//! file.save(&ledger)?;
//! ```

pub mod store;

pub use store::{SnapshotFile, StateError, StateResult};
