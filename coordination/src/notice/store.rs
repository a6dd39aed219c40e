//! Deduplication baseline persisted between cycles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Notice;

/// Last notice set that was announced (or silently accepted)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeStore {
    #[serde(default)]
    pub notices: Vec<Notice>,
    #[serde(default, alias = "last_check")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl NoticeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the baseline wholesale with `observed` and stamp the check time
    pub fn replace(&mut self, observed: Vec<Notice>) {
        self.notices = observed;
        self.last_checked_at = Some(Utc::now());
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }
}
