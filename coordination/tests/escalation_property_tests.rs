//! Escalation property tests over scripted failure/success sequences.
//!
//! Tests verify:
//! - Two occurrences never alert; the third does
//! - An alerted streak never re-alerts while it continues
//! - A pre-empted streak resumes its count when its category recurs
//! - Resolution credits the streak that actually alerted
//! - Runner-failure recovery ignores the shadow slot
//! - The ledger survives a JSON round trip between every step

use coordination::escalation::{
    Alert, ErrorCategory, ErrorLedger, EscalationEngine, Resolution, StreakSummary,
};

const ALL: [ErrorCategory; 5] = [
    ErrorCategory::Network,
    ErrorCategory::Timeout,
    ErrorCategory::Structure,
    ErrorCategory::RunnerFailure,
    ErrorCategory::Unknown,
];

/// One scripted cycle outcome
#[derive(Clone, Copy)]
enum Step {
    /// Failure whose alert (if any) is delivered
    Fail(ErrorCategory),
    /// Failure whose alert (if any) fails to deliver
    FailUndelivered(ErrorCategory),
    Success,
}

#[derive(Debug, Default)]
struct Trace {
    alerts: Vec<Alert>,
    resolutions: Vec<Resolution>,
}

/// Run steps the way the cycle driver does, persisting between each step.
fn run(engine: &EscalationEngine, ledger: &mut ErrorLedger, steps: &[Step]) -> Trace {
    let mut trace = Trace::default();
    for step in steps {
        match *step {
            Step::Fail(category) => {
                if let Some(alert) = engine.observe(ledger, category, format!("{category} failed")) {
                    engine.acknowledge(ledger, &alert);
                    trace.alerts.push(alert);
                }
            }
            Step::FailUndelivered(category) => {
                if let Some(alert) = engine.observe(ledger, category, "undelivered") {
                    trace.alerts.push(alert);
                }
            }
            Step::Success => {
                if let Some(resolution) = engine.resolve(ledger) {
                    trace.resolutions.push(resolution);
                }
            }
        }
        let json = serde_json::to_string(&*ledger).unwrap();
        *ledger = serde_json::from_str(&json).unwrap();
    }
    trace
}

fn repeat(step: Step, n: usize) -> Vec<Step> {
    vec![step; n]
}

// ── Property: no premature alert ───────────────────────────────────

#[test]
fn prop_two_occurrences_never_alert() {
    let engine = EscalationEngine::new();
    for category in ALL {
        let mut ledger = ErrorLedger::new();
        let trace = run(&engine, &mut ledger, &repeat(Step::Fail(category), 2));
        assert!(trace.alerts.is_empty(), "{category} alerted at count 2");
        assert_eq!(ledger.current.count, 2);

        let trace = run(&engine, &mut ledger, &[Step::Fail(category)]);
        assert_eq!(trace.alerts.len(), 1, "{category} did not alert at count 3");
        assert_eq!(trace.alerts[0].count, 3);
    }
}

// ── Property: edge-triggered alerts ────────────────────────────────

#[test]
fn prop_alert_sent_once_per_streak() {
    let engine = EscalationEngine::new();
    for category in ALL {
        for length in [3, 4, 7, 12] {
            let mut ledger = ErrorLedger::new();
            let trace = run(&engine, &mut ledger, &repeat(Step::Fail(category), length));
            assert_eq!(trace.alerts.len(), 1, "{category} x{length}");
            assert!(ledger.current.sent);
            assert_eq!(ledger.current.count, length as u32);
        }
    }
}

#[test]
fn prop_undelivered_alert_retries_each_cycle_until_delivered() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::FailUndelivered(ErrorCategory::Network), 5);
    steps.push(Step::Fail(ErrorCategory::Network));
    steps.push(Step::Fail(ErrorCategory::Network));
    let trace = run(&engine, &mut ledger, &steps);

    let counts: Vec<u32> = trace.alerts.iter().map(|a| a.count).collect();
    assert_eq!(counts, vec![3, 4, 5, 6], "retried at 3..5, delivered at 6, silent at 7");
    assert_eq!(ledger.current.count, 7);
}

// ── Property: shadow restoration ───────────────────────────────────

#[test]
fn prop_network_streak_restored_after_brief_structure_failure() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Network), 3);
    steps.push(Step::Fail(ErrorCategory::Structure));
    steps.push(Step::Fail(ErrorCategory::Network));
    let trace = run(&engine, &mut ledger, &steps);

    assert_eq!(trace.alerts.len(), 1);
    assert!(ledger.current.is_tracking(ErrorCategory::Network));
    assert_eq!(ledger.current.count, 4);
    assert!(ledger.current.sent, "restored streak keeps its delivered flag");
    assert!(!ledger.shadow.active);

    // Still the same streak: no second alert.
    let trace = run(&engine, &mut ledger, &[Step::Fail(ErrorCategory::Network)]);
    assert!(trace.alerts.is_empty());
    assert_eq!(ledger.current.count, 5);
}

#[test]
fn prop_restoration_works_for_every_category_pair() {
    let engine = EscalationEngine::new();
    for original in ALL {
        for interloper in ALL.into_iter().filter(|c| *c != original) {
            for interruptions in [1, 2] {
                let mut ledger = ErrorLedger::new();
                let mut steps = repeat(Step::Fail(original), 3);
                steps.extend(repeat(Step::Fail(interloper), interruptions));
                steps.push(Step::Fail(original));
                run(&engine, &mut ledger, &steps);
                assert!(
                    ledger.current.is_tracking(original),
                    "{original} after {interloper} x{interruptions}"
                );
                assert_eq!(ledger.current.count, 4);
            }
        }
    }
}

#[test]
fn prop_no_restoration_once_interloper_reaches_threshold() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Network), 3);
    steps.extend(repeat(Step::FailUndelivered(ErrorCategory::Structure), 3));
    steps.push(Step::Fail(ErrorCategory::Network));
    run(&engine, &mut ledger, &steps);

    assert!(ledger.current.is_tracking(ErrorCategory::Network));
    assert_eq!(ledger.current.count, 1, "structure reached 3, guard blocks restore");
}

#[test]
fn prop_sub_threshold_streak_is_never_archived() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Timeout), 2);
    steps.push(Step::Fail(ErrorCategory::Network));
    steps.push(Step::Fail(ErrorCategory::Timeout));
    run(&engine, &mut ledger, &steps);

    assert!(!ledger.shadow.active);
    assert_eq!(ledger.current.count, 1, "unalerted timeout streak was lost on purpose");
}

#[test]
fn prop_interloper_alert_cites_shadow() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Timeout), 4);
    steps.extend(repeat(Step::Fail(ErrorCategory::Structure), 3));
    let trace = run(&engine, &mut ledger, &steps);

    assert_eq!(trace.alerts.len(), 2);
    assert_eq!(trace.alerts[0].prior, None);
    assert_eq!(
        trace.alerts[1].prior,
        Some(StreakSummary {
            category: ErrorCategory::Timeout,
            count: 4
        })
    );
    assert!(!ledger.shadow.active, "cited shadow is discarded");
}

// ── Property: resolution credits the right streak ──────────────────

#[test]
fn prop_resolution_credits_preempted_streak() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Network), 3);
    steps.push(Step::Fail(ErrorCategory::Structure));
    steps.push(Step::Success);
    let trace = run(&engine, &mut ledger, &steps);

    assert_eq!(
        trace.resolutions,
        vec![Resolution::Recovered {
            category: ErrorCategory::Network,
            count: 3
        }]
    );
    assert!(ledger.is_clear());
}

#[test]
fn prop_resolution_prefers_current_alerted_streak() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Structure), 5);
    steps.push(Step::Success);
    let trace = run(&engine, &mut ledger, &steps);
    assert_eq!(
        trace.resolutions,
        vec![Resolution::Recovered {
            category: ErrorCategory::Structure,
            count: 5
        }]
    );
}

#[test]
fn prop_resolution_silent_when_nothing_alerted() {
    let engine = EscalationEngine::new();
    for category in ALL {
        let mut ledger = ErrorLedger::new();
        let mut steps = repeat(Step::Fail(category), 2);
        steps.push(Step::Success);
        let trace = run(&engine, &mut ledger, &steps);
        assert!(trace.resolutions.is_empty(), "{category}");
        assert!(ledger.is_clear());
    }
}

#[test]
fn prop_success_always_clears_ledger() {
    let engine = EscalationEngine::new();
    let scripts: Vec<Vec<Step>> = vec![
        vec![],
        repeat(Step::Fail(ErrorCategory::Unknown), 1),
        repeat(Step::FailUndelivered(ErrorCategory::Network), 4),
        [
            repeat(Step::Fail(ErrorCategory::Network), 3),
            repeat(Step::Fail(ErrorCategory::Timeout), 1),
        ]
        .concat(),
    ];
    for mut steps in scripts {
        let mut ledger = ErrorLedger::new();
        steps.push(Step::Success);
        run(&engine, &mut ledger, &steps);
        assert_eq!(ledger, ErrorLedger::new());
    }
}

#[test]
fn prop_second_success_is_silent() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Network), 3);
    steps.extend([Step::Success, Step::Success]);
    let trace = run(&engine, &mut ledger, &steps);
    assert_eq!(trace.resolutions.len(), 1);
}

// ── Property: runner-failure reset bypasses the shadow ─────────────

#[test]
fn prop_runner_recovery_ignores_shadow() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    let mut steps = repeat(Step::Fail(ErrorCategory::Network), 3);
    steps.extend(repeat(Step::Fail(ErrorCategory::RunnerFailure), 3));
    let trace = run(&engine, &mut ledger, &steps);

    assert_eq!(trace.alerts.len(), 2);
    assert_eq!(
        trace.alerts[1].prior.map(|p| p.category),
        Some(ErrorCategory::Network)
    );

    let trace = run(&engine, &mut ledger, &[Step::Success]);
    assert_eq!(trace.resolutions, vec![Resolution::RunnerRecovered { count: 3 }]);
    assert!(ledger.is_clear());
}

#[test]
fn prop_runner_recovery_ignores_undelivered_shadow_credit() {
    let engine = EscalationEngine::new();
    let mut ledger = ErrorLedger::new();
    // Runner alert never delivered, so the network shadow is still held.
    let mut steps = repeat(Step::Fail(ErrorCategory::Network), 3);
    steps.extend(repeat(Step::FailUndelivered(ErrorCategory::RunnerFailure), 3));
    run(&engine, &mut ledger, &steps);
    assert!(ledger.shadow.is_tracking(ErrorCategory::Network));

    let trace = run(&engine, &mut ledger, &[Step::Success]);
    assert!(trace.resolutions.is_empty());
    assert!(ledger.is_clear());
}
