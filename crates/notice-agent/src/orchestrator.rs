//! Cycle driver: fetch → parse → detect changes → escalate/resolve → notify → persist.
//!
//! One invocation runs exactly one cycle. Both snapshots are read at the
//! start and written once at the end, after every decision is made, so an
//! abandoned cycle leaves the files untouched. There are no retries inside
//! a cycle; the persisted ledger carries retry state to the next one.

use chrono::Local;
use coordination::escalation::{ErrorCategory, ErrorLedger, EscalationEngine};
use coordination::notice::{ChangeDetector, Notice, NoticeStore};
use coordination::state::SnapshotFile;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::fetcher::Fetcher;
use crate::messages;
use crate::notifier::Notifier;
use crate::parser::NoticeParser;
use crate::runner::RunnerContext;

/// Detail recorded when the page parses to nothing.
const EMPTY_PAGE_DETAIL: &str =
    "No notices found on the webpage. The HTML structure may have changed.";

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// The page could not be fetched
    FetchFailed { category: ErrorCategory, error: String },
    /// The page was fetched but held no notices
    StructureFailed,
    /// Nothing changed on the board
    NoNewNotices { total: usize },
    /// Notices were edited or removed, none added; baseline updated silently
    ContentDrift { total: usize },
    /// New notices announced and baseline updated
    Notified { total: usize, new: usize },
    /// New notices found but the announcement failed; baseline kept
    NotifyFailed { total: usize, new: usize },
    /// Out-of-band runner failure recorded
    RunnerFailureRecorded { count: u32 },
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed { category, error } => {
                write!(f, "❌ {} error fetching webpage: {}", category, error)
            }
            Self::StructureFailed => write!(f, "❌ {}", EMPTY_PAGE_DETAIL),
            Self::NoNewNotices { total } => {
                write!(f, "🎈 No new notices found ({} total)", total)
            }
            Self::ContentDrift { total } => {
                write!(f, "🎈 No new notices; cache refreshed ({} total)", total)
            }
            Self::Notified { new, .. } => {
                write!(f, "📢 Found {} new notices --> sent to telegram bot", new)
            }
            Self::NotifyFailed { new, .. } => {
                write!(f, "📢 Found {} new notices --> ❌ failed to send notification", new)
            }
            Self::RunnerFailureRecorded { count } => {
                write!(f, "🚨 Runner failure recorded ({} consecutive)", count)
            }
        }
    }
}

/// Runs poll cycles against one notice board.
pub struct Orchestrator<F, P, N> {
    config: WatchConfig,
    fetcher: F,
    parser: P,
    notifier: N,
    engine: EscalationEngine,
    store_file: SnapshotFile<NoticeStore>,
    ledger_file: SnapshotFile<ErrorLedger>,
}

impl<F: Fetcher, P: NoticeParser, N: Notifier> Orchestrator<F, P, N> {
    pub fn new(config: WatchConfig, fetcher: F, parser: P, notifier: N) -> Self {
        let engine = EscalationEngine::with_config(config.escalation_config());
        let store_file = SnapshotFile::new(&config.cache_path);
        let ledger_file = SnapshotFile::new(&config.error_state_path);
        Self {
            config,
            fetcher,
            parser,
            notifier,
            engine,
            store_file,
            ledger_file,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one full poll cycle.
    pub fn run_cycle(&self) -> CycleReport {
        let store = self.store_file.load_or_default();
        let mut ledger = self.ledger_file.load_or_default();
        debug!(
            baseline = store.len(),
            ledger = %ledger.summary(),
            "Loaded snapshots"
        );

        let (report, new_baseline) = self.decide(&store, &mut ledger);

        // Single write point for the cycle. The ledger goes first: if the
        // process dies between the two renames, the next cycle repeats a
        // digest rather than a resolution.
        self.ledger_file.save_or_warn(&ledger);
        if let Some(observed) = new_baseline {
            let mut store = store;
            store.replace(observed);
            self.store_file.save_or_warn(&store);
        }

        info!(report = %report, "Cycle complete");
        report
    }

    /// Record a runner failure reported by the scheduler's failure hook.
    pub fn report_runner_failure(&self, ctx: &RunnerContext) -> CycleReport {
        let mut ledger = self.ledger_file.load_or_default();
        self.record_failure(&mut ledger, ErrorCategory::RunnerFailure, ctx.detail(), Some(ctx));
        let count = ledger.current.count;
        self.ledger_file.save_or_warn(&ledger);

        let report = CycleReport::RunnerFailureRecorded { count };
        info!(report = %report, run = %ctx.run_url(), "Runner failure handled");
        report
    }

    /// All decisions for one cycle. Returns the report and, when the
    /// baseline should move, the notice set to store.
    fn decide(
        &self,
        store: &NoticeStore,
        ledger: &mut ErrorLedger,
    ) -> (CycleReport, Option<Vec<Notice>>) {
        let html = match self.fetcher.fetch(&self.config.source_url) {
            Ok(html) => html,
            Err(e) => {
                let category = e.category();
                warn!(%category, error = %e, "Fetch failed");
                self.record_failure(ledger, category, e.to_string(), None);
                return (
                    CycleReport::FetchFailed {
                        category,
                        error: e.to_string(),
                    },
                    None,
                );
            }
        };

        let observed = self.parser.parse(&html);
        if observed.is_empty() {
            warn!("Page fetched but no notices parsed");
            self.record_failure(ledger, ErrorCategory::Structure, EMPTY_PAGE_DETAIL, None);
            return (CycleReport::StructureFailed, None);
        }
        let total = observed.len();
        info!(total, "Notices parsed");

        if let Some(resolution) = self.engine.resolve(ledger) {
            // Best-effort: the failure is over whether or not this lands.
            if !self.notifier.send(&messages::resolution_message(&resolution)) {
                warn!(%resolution, "Resolution message not delivered");
            }
        }

        let change = ChangeDetector::compare(&observed, &store.notices);
        if change.has_new() {
            let new = change.new_notices.len();
            info!(new, "New notices found");
            let digest =
                messages::notice_digest(&change.new_notices, &self.config.source_url, Local::now());
            let parts = digest.len();
            // Stop at the first rejected part; the whole digest is resent next cycle.
            if digest.iter().all(|part| self.notifier.send(part)) {
                debug!(parts, "Notice digest delivered");
                (CycleReport::Notified { total, new }, Some(observed))
            } else {
                warn!(new, "Notice digest not delivered; baseline kept for retry");
                (CycleReport::NotifyFailed { total, new }, None)
            }
        } else if change.content_changed {
            info!(
                from = %change.baseline_fingerprint,
                to = %change.observed_fingerprint,
                "Board content drifted without new notices"
            );
            (CycleReport::ContentDrift { total }, Some(observed))
        } else {
            (CycleReport::NoNewNotices { total }, None)
        }
    }

    /// Failure path: count the occurrence and deliver an alert if one is due.
    fn record_failure(
        &self,
        ledger: &mut ErrorLedger,
        category: ErrorCategory,
        detail: impl Into<String>,
        runner: Option<&RunnerContext>,
    ) {
        let Some(alert) = self.engine.observe(ledger, category, detail) else {
            return;
        };
        if self.notifier.send(&messages::alert_message(&alert, runner)) {
            self.engine.acknowledge(ledger, &alert);
        } else {
            warn!(%category, count = alert.count, "Alert not delivered; will retry next cycle");
        }
    }
}
