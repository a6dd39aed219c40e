//! The persisted two-slot error ledger

use serde::{Deserialize, Serialize};

/// Failure categories tracked by the ledger
///
/// The engine treats every category the same way; only message text
/// differs per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Connection refused, DNS failure, non-2xx status
    Network,
    /// Fetch exceeded its deadline
    #[serde(alias = "manualTimeout")]
    Timeout,
    /// Page fetched but no notices could be extracted
    Structure,
    /// The poll process itself could not run (reported out of band)
    #[serde(alias = "runnerFailure")]
    RunnerFailure,
    /// Anything not classified above
    Unknown,
}

impl ErrorCategory {
    /// Human-readable title used in alert and resolution messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "Network Error",
            Self::Timeout => "Timeout Error",
            Self::Structure => "Website Structure Changed",
            Self::RunnerFailure => "Runner Failure",
            Self::Unknown => "Unknown Error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::Structure => write!(f, "structure"),
            Self::RunnerFailure => write!(f, "runner_failure"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One tracked failure streak
///
/// `active == false` is the canonical "no error" state. `count` only
/// counts consecutive occurrences of `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(default, alias = "type")]
    pub category: Option<ErrorCategory>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub count: u32,
    /// Whether the alert for this streak has been delivered
    #[serde(default)]
    pub sent: bool,
    #[serde(default, alias = "detail_error")]
    pub detail: String,
}

impl ErrorRecord {
    /// The empty record
    pub fn empty() -> Self {
        Self {
            category: None,
            active: false,
            count: 0,
            sent: false,
            detail: String::new(),
        }
    }

    /// A fresh streak at count 1
    pub fn first(category: ErrorCategory, detail: impl Into<String>) -> Self {
        Self {
            category: Some(category),
            active: true,
            count: 1,
            sent: false,
            detail: detail.into(),
        }
    }

    /// Whether this record tracks an ongoing streak of `category`
    pub fn is_tracking(&self, category: ErrorCategory) -> bool {
        self.active && self.category == Some(category)
    }

    /// Whether the streak crossed `threshold` and its alert went out
    pub fn is_significant(&self, threshold: u32) -> bool {
        self.active && self.sent && self.count >= threshold
    }

    /// Summary of this streak, if it is active
    pub fn summary(&self) -> Option<StreakSummary> {
        match (self.active, self.category) {
            (true, Some(category)) => Some(StreakSummary {
                category,
                count: self.count,
            }),
            _ => None,
        }
    }
}

impl Default for ErrorRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Category and length of a streak, as cited in messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub category: ErrorCategory,
    pub count: u32,
}

impl std::fmt::Display for StreakSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.category, self.count)
    }
}

/// Persisted escalation state: the tracked streak plus one displaced streak
///
/// `shadow` holds a streak that had already alerted when a different
/// category pre-empted it. It is kept so that the original category can
/// resume its count, and so a later resolution can credit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLedger {
    #[serde(default, alias = "last_error")]
    pub current: ErrorRecord,
    #[serde(default, alias = "previous_error")]
    pub shadow: ErrorRecord,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset both slots to the empty pair
    pub fn reset(&mut self) {
        self.current = ErrorRecord::empty();
        self.shadow = ErrorRecord::empty();
    }

    /// Whether no failure is being tracked in either slot
    pub fn is_clear(&self) -> bool {
        !self.current.active && !self.shadow.active
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        let slot = |r: &ErrorRecord| match r.summary() {
            Some(s) => format!("{}{}", s, if r.sent { " (sent)" } else { "" }),
            None => "-".to_string(),
        };
        format!("current={} shadow={}", slot(&self.current), slot(&self.shadow))
    }
}
