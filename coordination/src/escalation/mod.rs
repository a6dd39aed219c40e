//! Escalation engine: edge-triggered failure alerts with deferred credit
//!
//! Decides, once per poll cycle, whether a failure alert or a recovery
//! message is owed. This is a pure state machine over the persisted
//! [`ErrorLedger`]; delivery is the caller's job.
//!
//! # Streak lifecycle
//!
//! ```text
//! failure(cat) ──► count 1 ──► count 2 ──► count 3: ALERT (once per streak)
//!     │                                        │
//!     │  different category pre-empts          │  different category pre-empts
//!     ▼                                        ▼
//! fresh streak                         alerted streak archived to shadow
//!                                              │
//!                                              ├─ original category recurs while
//!                                              │  the interloper is still small
//!                                              │  → streak restored at shadow.count + 1
//!                                              │
//!                                              └─ interloper alerts → shadow cited
//!                                                 in its alert, then discarded
//!
//! success ──► resolution for the streak that alerted (current, else shadow)
//!         ──► runner_failure streaks resolve on their own, shadow ignored
//!         ──► ledger reset to the empty pair
//! ```

pub mod engine;
pub mod state;

pub use engine::{Alert, EscalationConfig, EscalationEngine, Resolution};
pub use state::{ErrorCategory, ErrorLedger, ErrorRecord, StreakSummary};
