//! Per-invocation run log and CI step summary.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::warn;

/// `"{start} | {elapsed}s | {outcome}"`, one line per invocation.
pub fn run_log_line(started: DateTime<Local>, elapsed: Duration, outcome: &str) -> String {
    format!(
        "{} |  {:.2}s   | {}",
        started.format("%Y-%m-%d %H:%M:%S"),
        elapsed.as_secs_f64(),
        outcome
    )
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

/// Append the run line to the log file and the outcome to the step summary.
///
/// Either destination may be absent. Write failures are logged and dropped.
pub fn record_run(
    log_path: Option<&Path>,
    step_summary_path: Option<&Path>,
    started: DateTime<Local>,
    elapsed: Duration,
    outcome: &str,
) {
    if let Some(path) = log_path {
        if let Err(e) = append_line(path, &run_log_line(started, elapsed, outcome)) {
            warn!(path = %path.display(), error = %e, "Failed to append run log");
        }
    }
    if let Some(path) = step_summary_path {
        if let Err(e) = append_line(path, outcome) {
            warn!(path = %path.display(), error = %e, "Failed to append step summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_log_line_format() {
        let started = Local.with_ymd_and_hms(2024, 3, 12, 9, 30, 5).unwrap();
        let line = run_log_line(started, Duration::from_millis(1234), "No new notices");
        assert_eq!(line, "2024-03-12 09:30:05 |  1.23s   | No new notices");
    }

    #[test]
    fn test_record_run_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs/log.txt");
        let summary = dir.path().join("summary.md");
        let started = Local::now();

        record_run(Some(&log), Some(&summary), started, Duration::ZERO, "first");
        record_run(Some(&log), None, started, Duration::ZERO, "second");

        let log_text = std::fs::read_to_string(&log).unwrap();
        assert_eq!(log_text.lines().count(), 2);
        assert!(log_text.lines().nth(1).unwrap().ends_with("| second"));
        assert_eq!(std::fs::read_to_string(&summary).unwrap(), "first\n");
    }
}
