//! Deterministic alert and resolution decisions over the error ledger
//!
//! Consumes cycle outcomes and an [`ErrorLedger`] to decide whether an
//! alert or a resolution message is due. No I/O happens here: the caller
//! delivers the message and reports back through [`EscalationEngine::acknowledge`].

use crate::escalation::state::{ErrorCategory, ErrorLedger, ErrorRecord, StreakSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Alert that became due this cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub category: ErrorCategory,
    /// Consecutive occurrences, including this one
    pub count: u32,
    pub detail: String,
    /// Pre-empted streak that had already alerted, if any
    pub prior: Option<StreakSummary>,
}

/// Resolution message owed after a successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Resolution {
    /// The poll process runs again after `count` failed invocations
    RunnerRecovered { count: u32 },
    /// An alerted streak of `category` is over
    Recovered { category: ErrorCategory, count: u32 },
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunnerRecovered { count } => write!(f, "runner recovered after {}", count),
            Self::Recovered { category, count } => {
                write!(f, "{} resolved after {}", category, count)
            }
        }
    }
}

/// Configuration for the Escalation Engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Consecutive occurrences before an alert is sent. Also the bar a
    /// streak must clear to be archived into the shadow slot.
    pub alert_threshold: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { alert_threshold: 3 }
    }
}

/// Deterministic state machine over the ledger
#[derive(Debug, Clone, Default)]
pub struct EscalationEngine {
    config: EscalationConfig,
}

impl EscalationEngine {
    /// Create a new engine with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Record one failure occurrence and return the alert that is due, if any
    ///
    /// Transitions:
    /// 1. Same category still active → count + 1, `sent` kept.
    /// 2. Different category, and the shadow holds this category while the
    ///    current streak is below threshold and unsent → restore the shadow
    ///    streak at `shadow.count + 1`.
    /// 3. Different category otherwise → archive the current streak into the
    ///    shadow if it had alerted, then start fresh at 1.
    /// 4. Nothing active → start fresh at 1.
    ///
    /// Alerts are edge-triggered: one is returned whenever the count is at or
    /// above threshold and the streak has not been delivered yet.
    pub fn observe(
        &self,
        ledger: &mut ErrorLedger,
        category: ErrorCategory,
        detail: impl Into<String>,
    ) -> Option<Alert> {
        let detail = detail.into();
        let threshold = self.config.alert_threshold;

        if ledger.current.is_tracking(category) {
            ledger.current.count += 1;
            ledger.current.detail = detail;
            debug!(%category, count = ledger.current.count, "Streak continues");
        } else if ledger.current.category != Some(category) {
            if self.can_restore(ledger, category) {
                let restored = ErrorRecord {
                    category: Some(category),
                    active: true,
                    count: ledger.shadow.count + 1,
                    sent: ledger.shadow.sent,
                    detail,
                };
                debug!(
                    %category,
                    count = restored.count,
                    preempted_by = ?ledger.current.category,
                    "Restoring pre-empted streak"
                );
                ledger.current = restored;
                ledger.shadow = ErrorRecord::empty();
            } else {
                if ledger.current.is_significant(threshold) {
                    debug!(
                        archived = ?ledger.current.category,
                        count = ledger.current.count,
                        "Archiving alerted streak into shadow"
                    );
                    ledger.shadow = ErrorRecord {
                        active: true,
                        sent: true,
                        ..ledger.current.clone()
                    };
                }
                ledger.current = ErrorRecord::first(category, detail);
            }
        } else {
            // Same category but inactive: the ledger was reset since.
            ledger.current = ErrorRecord::first(category, detail);
        }

        self.pending_alert(ledger)
    }

    /// Mark the alert returned by [`observe`](Self::observe) as delivered
    ///
    /// Only call this after the notifier reported success. A shadow streak
    /// cited in the alert has now been acknowledged and is discarded.
    pub fn acknowledge(&self, ledger: &mut ErrorLedger, alert: &Alert) {
        if !ledger.current.is_tracking(alert.category) {
            return;
        }
        ledger.current.sent = true;
        if alert.prior.is_some() {
            ledger.shadow = ErrorRecord::empty();
        }
        info!(category = %alert.category, count = alert.count, "Alert delivered");
    }

    /// Close out all failure memory after a successful cycle
    ///
    /// Returns the resolution message that is owed, if any. The ledger is
    /// reset in every case; delivery of the resolution is best-effort.
    pub fn resolve(&self, ledger: &mut ErrorLedger) -> Option<Resolution> {
        let current = &ledger.current;
        let shadow = &ledger.shadow;

        let resolution = if current.is_tracking(ErrorCategory::RunnerFailure) {
            // A runner crash invalidates any in-flight category tracking,
            // so the shadow is never credited here.
            current
                .sent
                .then_some(Resolution::RunnerRecovered { count: current.count })
        } else if current.active {
            if current.sent {
                current.category.map(|category| Resolution::Recovered {
                    category,
                    count: current.count,
                })
            } else if shadow.active && shadow.sent {
                shadow.category.map(|category| Resolution::Recovered {
                    category,
                    count: shadow.count,
                })
            } else {
                None
            }
        } else {
            None
        };

        if !ledger.is_clear() {
            match &resolution {
                Some(r) => info!(resolution = %r, "Failure streak resolved"),
                None => debug!(ledger = %ledger.summary(), "Clearing sub-threshold streak"),
            }
        }

        ledger.reset();
        resolution
    }

    /// Shadow restoration guard (transition 2)
    fn can_restore(&self, ledger: &ErrorLedger, category: ErrorCategory) -> bool {
        ledger.shadow.is_tracking(category)
            && ledger.current.count < self.config.alert_threshold
            && !ledger.current.sent
    }

    fn pending_alert(&self, ledger: &ErrorLedger) -> Option<Alert> {
        let current = &ledger.current;
        if current.count < self.config.alert_threshold || current.sent {
            return None;
        }
        let category = current.category?;
        let prior = if ledger.shadow.active && ledger.shadow.sent {
            ledger.shadow.summary()
        } else {
            None
        };
        info!(%category, count = current.count, prior = ?prior, "Alert threshold reached");
        Some(Alert {
            category,
            count: current.count,
            detail: current.detail.clone(),
            prior,
        })
    }
}
