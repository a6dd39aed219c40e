//! Change detection between two observations of the notice board

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{content_fingerprint, Notice};

/// Result of comparing an observed notice set against the baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Observed notices whose identity is absent from the baseline, in observed order
    pub new_notices: Vec<Notice>,
    /// Whether the set of identities differs at all
    pub content_changed: bool,
    pub baseline_fingerprint: String,
    pub observed_fingerprint: String,
}

impl ChangeSet {
    pub fn has_new(&self) -> bool {
        !self.new_notices.is_empty()
    }

    /// Content moved without anything classified as new (edits, removals)
    pub fn is_drift_only(&self) -> bool {
        self.content_changed && !self.has_new()
    }
}

/// Stateless comparator
pub struct ChangeDetector;

impl ChangeDetector {
    /// Notices in `observed` whose identity does not appear in `baseline`
    ///
    /// Order follows `observed`. Nothing is capped.
    pub fn diff(observed: &[Notice], baseline: &[Notice]) -> Vec<Notice> {
        let known: HashSet<&str> = baseline.iter().map(|n| n.id.as_str()).collect();
        observed
            .iter()
            .filter(|n| !known.contains(n.id.as_str()))
            .cloned()
            .collect()
    }

    /// Per-notice diff plus whole-set fingerprint comparison
    pub fn compare(observed: &[Notice], baseline: &[Notice]) -> ChangeSet {
        let new_notices = Self::diff(observed, baseline);
        let baseline_fingerprint = content_fingerprint(baseline);
        let observed_fingerprint = content_fingerprint(observed);
        let content_changed = baseline_fingerprint != observed_fingerprint;

        debug!(
            observed = observed.len(),
            baseline = baseline.len(),
            new = new_notices.len(),
            content_changed,
            "Compared notice sets"
        );

        ChangeSet {
            new_notices,
            content_changed,
            baseline_fingerprint,
            observed_fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(title: &str) -> Notice {
        Notice::new("", title, "2024-01-01", "")
    }

    #[test]
    fn test_diff_of_identical_sets_is_empty() {
        let set = vec![notice("a"), notice("b")];
        assert!(ChangeDetector::diff(&set, &set).is_empty());
    }

    #[test]
    fn test_diff_preserves_observed_order() {
        let baseline = vec![notice("b")];
        let observed = vec![notice("c"), notice("b"), notice("a")];
        let titles: Vec<_> = ChangeDetector::diff(&observed, &baseline)
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["c", "a"]);
    }

    #[test]
    fn test_diff_is_not_capped() {
        let observed: Vec<_> = (0..25).map(|i| notice(&format!("n{i}"))).collect();
        assert_eq!(ChangeDetector::diff(&observed, &[]).len(), 25);
    }

    #[test]
    fn test_compare_unchanged() {
        let set = vec![notice("a")];
        let change = ChangeDetector::compare(&set, &set);
        assert!(!change.has_new());
        assert!(!change.content_changed);
        assert!(!change.is_drift_only());
    }

    #[test]
    fn test_compare_removal_is_drift() {
        let baseline = vec![notice("a"), notice("b")];
        let observed = vec![notice("a")];
        let change = ChangeDetector::compare(&observed, &baseline);
        assert!(!change.has_new());
        assert!(change.is_drift_only());
    }

    #[test]
    fn test_compare_edit_is_new_and_changed() {
        let baseline = vec![notice("a")];
        let observed = vec![notice("a (corrected)")];
        let change = ChangeDetector::compare(&observed, &baseline);
        assert!(change.has_new());
        assert!(change.content_changed);
        assert!(!change.is_drift_only());
    }
}
