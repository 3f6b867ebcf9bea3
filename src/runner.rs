//! Suite execution engine.
//!
//! The [`Runner`] walks a suite's tests in registration order and drives the
//! setup, test and teardown phases of each one through an [`Isolation`]
//! backend. Every test ends in exactly one [`Outcome`]; a problem in the
//! teardown phase is attached as `cleanup` and never changes the outcome.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{IsolationMode, RunnerConfig};
use crate::error::RunError;
#[cfg(unix)]
use crate::isolation::ForkIsolation;
use crate::isolation::{signal_name, InProcessIsolation, Isolation, Phase, Termination};
use crate::report::Reporter;
use crate::status::Status;
use crate::suite::{Suite, TestCase};

/// Why a test was classified as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorCause {
    /// The phase was killed by a signal.
    Signaled { phase: Phase, signal: i32 },
    /// The phase exited with a nonzero code.
    Exited { phase: Phase, code: i32 },
    /// User code in the phase panicked.
    Panicked { phase: Phase },
    /// The phase exceeded the configured timeout.
    TimedOut { phase: Phase },
    /// The test finished cleanly but no complete status record arrived.
    MissingStatus { reason: String },
    /// An assertion was used with invalid arguments.
    InvalidAssertion { assertion: String, message: String },
}

impl ErrorCause {
    /// Cause for a non-clean termination, `None` for a clean one.
    pub fn from_termination(phase: Phase, termination: Termination) -> Option<Self> {
        match termination {
            Termination::Exited(0) => None,
            Termination::Exited(code) => Some(ErrorCause::Exited { phase, code }),
            Termination::Signaled(signal) => Some(ErrorCause::Signaled { phase, signal }),
            Termination::Panicked => Some(ErrorCause::Panicked { phase }),
            Termination::TimedOut => Some(ErrorCause::TimedOut { phase }),
        }
    }

    /// Phase the cause is attributed to.
    pub fn phase(&self) -> Phase {
        match self {
            ErrorCause::Signaled { phase, .. }
            | ErrorCause::Exited { phase, .. }
            | ErrorCause::Panicked { phase }
            | ErrorCause::TimedOut { phase } => *phase,
            ErrorCause::MissingStatus { .. } | ErrorCause::InvalidAssertion { .. } => Phase::Test,
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCause::Signaled { phase, signal } => write!(
                f,
                "{} terminated by signal {} ({})",
                phase,
                signal,
                signal_name(*signal)
            ),
            ErrorCause::Exited { phase, code } => write!(f, "{} failed with status {}", phase, code),
            ErrorCause::Panicked { phase } => write!(f, "{} panicked", phase),
            ErrorCause::TimedOut { phase } => write!(f, "{} timed out", phase),
            ErrorCause::MissingStatus { reason } => write!(f, "test status not received: {}", reason),
            ErrorCause::InvalidAssertion { assertion, message } => write!(f, "{}\n{}", assertion, message),
        }
    }
}

/// Three-way classification of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure { assertion: String },
    Error { cause: ErrorCause },
}

impl Outcome {
    /// Classify a status transmitted by a cleanly terminated test.
    pub fn from_status(status: Status) -> Self {
        match status.invalid {
            Some(message) => Outcome::Error {
                cause: ErrorCause::InvalidAssertion {
                    assertion: status.assertion,
                    message,
                },
            },
            None if status.failed => Outcome::Failure {
                assertion: status.assertion,
            },
            None => Outcome::Success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error { .. })
    }
}

/// Result of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub name: String,
    pub outcome: Outcome,
    /// Teardown problem, reported without changing the outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<ErrorCause>,
}

impl TestReport {
    fn new(name: &str, outcome: Outcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            cleanup: None,
        }
    }
}

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub errors: usize,
}

impl Tally {
    /// Count outcomes. Successes are derived as the remainder so the three
    /// counts always sum to `total`.
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a TestReport>) -> Self {
        let mut tally = Tally::default();
        for report in reports {
            tally.total += 1;
            match report.outcome {
                Outcome::Failure { .. } => tally.failures += 1,
                Outcome::Error { .. } => tally.errors += 1,
                Outcome::Success => {}
            }
        }
        tally.successes = tally.total - tally.failures - tally.errors;
        tally
    }

    /// `count` as a percentage of `total`; 0 for an empty tally.
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// True when nothing failed or errored.
    pub fn is_success(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }

    fn merge(self, other: Tally) -> Tally {
        Tally {
            total: self.total + other.total,
            successes: self.successes + other.successes,
            failures: self.failures + other.failures,
            errors: self.errors + other.errors,
        }
    }
}

/// Results of one suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub tests: Vec<TestReport>,
}

impl SuiteReport {
    pub fn tally(&self) -> Tally {
        Tally::from_reports(&self.tests)
    }
}

/// Results of several suite runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub suites: Vec<SuiteReport>,
}

impl RunSummary {
    pub fn tally(&self) -> Tally {
        self.suites
            .iter()
            .map(SuiteReport::tally)
            .fold(Tally::default(), Tally::merge)
    }

    /// Process exit code: 0 when every test succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.tally().is_success() {
            0
        } else {
            1
        }
    }
}

/// Runs suites through an isolation backend.
pub struct Runner {
    isolation: Box<dyn Isolation>,
}

impl Runner {
    /// Build a runner from configuration.
    pub fn new(config: &RunnerConfig) -> Self {
        match config.isolation {
            #[cfg(unix)]
            IsolationMode::Fork => Self::with_isolation(ForkIsolation::new(config.phase_timeout())),
            #[cfg(not(unix))]
            IsolationMode::Fork => {
                warn!("Fork isolation is unavailable on this platform, running tests in process");
                Self::with_isolation(InProcessIsolation::new())
            }
            IsolationMode::InProcess => Self::with_isolation(InProcessIsolation::new()),
        }
    }

    /// Build a runner around a specific backend.
    pub fn with_isolation(isolation: impl Isolation + 'static) -> Self {
        Self {
            isolation: Box::new(isolation),
        }
    }

    /// Name of the active isolation backend.
    pub fn isolation_name(&self) -> &'static str {
        self.isolation.name()
    }

    /// Run every test of `suite` in registration order.
    ///
    /// Crashes, failures and errors of individual tests are contained in the
    /// returned report. An `Err` means the runner itself could not continue.
    pub fn run(&self, suite: &Suite, reporter: &mut dyn Reporter) -> Result<SuiteReport, RunError> {
        info!(
            suite = suite.name(),
            tests = suite.len(),
            isolation = self.isolation.name(),
            "Starting suite"
        );
        reporter.suite_started(suite.name(), suite.len());

        let mut tests = Vec::with_capacity(suite.len());
        for case in suite.tests() {
            let report = self.run_case(suite, case)?;
            reporter.test_finished(suite.name(), &report);
            tests.push(report);
        }

        let report = SuiteReport {
            name: suite.name().to_string(),
            tests,
        };
        let tally = report.tally();
        info!(
            suite = suite.name(),
            total = tally.total,
            successes = tally.successes,
            failures = tally.failures,
            errors = tally.errors,
            "Suite complete"
        );
        reporter.suite_finished(&report);
        Ok(report)
    }

    /// Run several suites in order.
    pub fn run_all(&self, suites: &[Suite], reporter: &mut dyn Reporter) -> Result<RunSummary, RunError> {
        let suites = suites
            .iter()
            .map(|suite| self.run(suite, reporter))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RunSummary { suites })
    }

    fn run_case(&self, suite: &Suite, case: &TestCase) -> Result<TestReport, RunError> {
        if let Some(before) = suite.before() {
            let termination = self.isolation.run_procedure(Phase::Setup, before)?;
            if let Some(cause) = ErrorCause::from_termination(Phase::Setup, termination) {
                warn!(suite = suite.name(), test = case.name(), %cause, "Setup failed, test skipped");
                return Ok(TestReport::new(case.name(), Outcome::Error { cause }));
            }
        }

        let run = self.isolation.run_test(case)?;
        if let Some(cause) = ErrorCause::from_termination(Phase::Test, run.termination) {
            warn!(suite = suite.name(), test = case.name(), %cause, "Test terminated abnormally");
            return Ok(TestReport::new(case.name(), Outcome::Error { cause }));
        }

        let mut cleanup = None;
        if let Some(after) = suite.after() {
            let termination = self.isolation.run_procedure(Phase::Teardown, after)?;
            cleanup = ErrorCause::from_termination(Phase::Teardown, termination);
            if let Some(cause) = &cleanup {
                warn!(suite = suite.name(), test = case.name(), %cause, "Teardown failed");
            }
        }

        let outcome = match run.channel.collect() {
            Ok(status) => Outcome::from_status(status),
            Err(e) => {
                warn!(suite = suite.name(), test = case.name(), error = %e, "No status from test");
                Outcome::Error {
                    cause: ErrorCause::MissingStatus {
                        reason: e.to_string(),
                    },
                }
            }
        };

        Ok(TestReport {
            name: case.name().to_string(),
            outcome,
            cleanup,
        })
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(&RunnerConfig::default())
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("isolation", &self.isolation.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isolation::{StatusChannel, TestRun};
    use crate::report::NullReporter;
    use crate::status::Verdict;
    use crate::suite::Procedure;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Backend that replays scripted terminations and runs test bodies
    /// in process.
    #[derive(Default)]
    struct ScriptedIsolation {
        procedures: RefCell<VecDeque<Termination>>,
        tests: RefCell<VecDeque<Termination>>,
        calls: RefCell<Vec<Phase>>,
    }

    impl ScriptedIsolation {
        fn procedures(self, script: &[Termination]) -> Self {
            self.procedures.borrow_mut().extend(script.iter().copied());
            self
        }

        fn tests(self, script: &[Termination]) -> Self {
            self.tests.borrow_mut().extend(script.iter().copied());
            self
        }
    }

    impl Isolation for ScriptedIsolation {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn run_procedure(&self, phase: Phase, _: Procedure) -> Result<Termination, RunError> {
            self.calls.borrow_mut().push(phase);
            Ok(self
                .procedures
                .borrow_mut()
                .pop_front()
                .unwrap_or(Termination::Exited(0)))
        }

        fn run_test(&self, case: &TestCase) -> Result<TestRun, RunError> {
            self.calls.borrow_mut().push(Phase::Test);
            let termination = self
                .tests
                .borrow_mut()
                .pop_front()
                .unwrap_or(Termination::Exited(0));
            let mut status = Status::default();
            let _ = case.invoke(&mut status);
            let channel = if termination.is_clean() {
                StatusChannel::Ready(status)
            } else {
                StatusChannel::Closed
            };
            Ok(TestRun {
                termination,
                channel,
            })
        }
    }

    fn pass(_: &mut Status) -> Verdict {
        Ok(())
    }

    fn failing(s: &mut Status) -> Verdict {
        s.assert_true(1 == 2, "one equals two")
    }

    fn invalid(s: &mut Status) -> Verdict {
        s.assert_array_equals(&[1], &[1], 0, "empty arrays")
    }

    fn noop() {}

    fn run(isolation: impl Isolation + 'static, suite: &Suite) -> SuiteReport {
        Runner::with_isolation(isolation)
            .run(suite, &mut NullReporter)
            .unwrap()
    }

    #[test]
    fn test_empty_suite_reports_zero() {
        let isolation = ScriptedIsolation::default();
        let report = run(isolation, &Suite::named("empty"));
        assert!(report.tests.is_empty());
        assert_eq!(report.tally(), Tally::default());
        assert!(report.tally().is_success());
    }

    #[test]
    fn test_classification_and_tally() {
        let mut suite = Suite::named("mixed");
        suite
            .register(pass, "pass")
            .register(failing, "fail")
            .register(invalid, "invalid")
            .register(pass, "crash");
        let isolation = ScriptedIsolation::default().tests(&[
            Termination::Exited(0),
            Termination::Exited(0),
            Termination::Exited(0),
            Termination::Signaled(11),
        ]);

        let report = run(isolation, &suite);
        let outcomes: Vec<_> = report.tests.iter().map(|t| &t.outcome).collect();
        assert!(outcomes[0].is_success());
        assert_eq!(
            outcomes[1],
            &Outcome::Failure {
                assertion: "one equals two".to_string()
            }
        );
        assert!(matches!(
            outcomes[2],
            Outcome::Error {
                cause: ErrorCause::InvalidAssertion { .. }
            }
        ));
        assert_eq!(
            outcomes[3],
            &Outcome::Error {
                cause: ErrorCause::Signaled {
                    phase: Phase::Test,
                    signal: 11
                }
            }
        );

        let tally = report.tally();
        assert_eq!(
            tally,
            Tally {
                total: 4,
                successes: 1,
                failures: 1,
                errors: 2
            }
        );
        assert_eq!(tally.successes + tally.failures + tally.errors, tally.total);
        assert!((tally.percentage(tally.errors) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_setup_failure_skips_test_and_teardown() {
        let mut suite = Suite::named("fixtures").with_before(noop).with_after(noop);
        suite.register(pass, "first").register(pass, "second");
        let isolation = ScriptedIsolation::default().procedures(&[
            Termination::Exited(2),
            Termination::Exited(0),
            Termination::Exited(0),
        ]);
        let runner = Runner::with_isolation(isolation);
        let report = runner.run(&suite, &mut NullReporter).unwrap();

        assert_eq!(
            report.tests[0].outcome,
            Outcome::Error {
                cause: ErrorCause::Exited {
                    phase: Phase::Setup,
                    code: 2
                }
            }
        );
        assert!(report.tests[1].outcome.is_success());
        assert_eq!(report.tally().errors, 1);
    }

    #[test]
    fn test_phase_order_with_fixtures() {
        let isolation = std::rc::Rc::new(ScriptedIsolation::default().tests(&[
            Termination::Exited(0),
            Termination::Panicked,
        ]));

        struct Shared(std::rc::Rc<ScriptedIsolation>);
        impl Isolation for Shared {
            fn name(&self) -> &'static str {
                self.0.name()
            }
            fn run_procedure(&self, phase: Phase, p: Procedure) -> Result<Termination, RunError> {
                self.0.run_procedure(phase, p)
            }
            fn run_test(&self, case: &TestCase) -> Result<TestRun, RunError> {
                self.0.run_test(case)
            }
        }

        let mut suite = Suite::named("order").with_before(noop).with_after(noop);
        suite.register(pass, "ok").register(pass, "panics");
        let report = run(Shared(isolation.clone()), &suite);

        // The panicking test skips its teardown.
        assert_eq!(
            *isolation.calls.borrow(),
            vec![
                Phase::Setup,
                Phase::Test,
                Phase::Teardown,
                Phase::Setup,
                Phase::Test
            ]
        );
        assert_eq!(
            report.tests[1].outcome,
            Outcome::Error {
                cause: ErrorCause::Panicked { phase: Phase::Test }
            }
        );
    }

    #[test]
    fn test_teardown_failure_is_cleanup_only() {
        let mut suite = Suite::named("cleanup").with_after(noop);
        suite.register(failing, "fails").register(pass, "passes");
        let isolation = ScriptedIsolation::default()
            .procedures(&[Termination::Signaled(6), Termination::TimedOut]);

        let report = run(isolation, &suite);
        assert!(report.tests[0].outcome.is_failure());
        assert_eq!(
            report.tests[0].cleanup,
            Some(ErrorCause::Signaled {
                phase: Phase::Teardown,
                signal: 6
            })
        );
        assert!(report.tests[1].outcome.is_success());
        assert_eq!(
            report.tests[1].cleanup,
            Some(ErrorCause::TimedOut {
                phase: Phase::Teardown
            })
        );
        assert_eq!(report.tally().errors, 0);
    }

    #[test]
    fn test_missing_status_is_error() {
        struct Silent;
        impl Isolation for Silent {
            fn name(&self) -> &'static str {
                "silent"
            }
            fn run_procedure(&self, _: Phase, _: Procedure) -> Result<Termination, RunError> {
                Ok(Termination::Exited(0))
            }
            fn run_test(&self, _: &TestCase) -> Result<TestRun, RunError> {
                Ok(TestRun {
                    termination: Termination::Exited(0),
                    channel: StatusChannel::Closed,
                })
            }
        }

        let mut suite = Suite::named("silent");
        suite.register(pass, "exits early");
        let report = run(Silent, &suite);
        assert!(matches!(
            report.tests[0].outcome,
            Outcome::Error {
                cause: ErrorCause::MissingStatus { .. }
            }
        ));
    }

    #[test]
    fn test_in_process_runner_contains_panics() {
        let mut suite = Suite::named("in process");
        suite
            .register(|_: &mut Status| -> Verdict { panic!("boom") }, "panics")
            .register(pass, "after panic");
        let report = run(InProcessIsolation::new(), &suite);
        assert!(report.tests[0].outcome.is_error());
        assert!(report.tests[1].outcome.is_success());
    }

    #[test]
    fn test_run_summary_exit_code() {
        let mut good = Suite::named("good");
        good.register(pass, "pass");
        let mut bad = Suite::named("bad");
        bad.register(failing, "fail");

        let runner = Runner::with_isolation(InProcessIsolation::new());
        let summary = runner.run_all(&[good], &mut NullReporter).unwrap();
        assert_eq!(summary.exit_code(), 0);

        let summary = runner.run_all(&[bad], &mut NullReporter).unwrap();
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.tally().failures, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_error_cause_display() {
        let cause = ErrorCause::Signaled {
            phase: Phase::Setup,
            signal: 11,
        };
        assert_eq!(
            cause.to_string(),
            "before procedure terminated by signal 11 (SIGSEGV)"
        );
        let cause = ErrorCause::Exited {
            phase: Phase::Test,
            code: 3,
        };
        assert_eq!(cause.to_string(), "test failed with status 3");
        assert_eq!(cause.phase(), Phase::Test);
    }

    #[test]
    fn test_reports_serialize_with_tags() {
        let report = TestReport {
            name: "t".to_string(),
            outcome: Outcome::Error {
                cause: ErrorCause::TimedOut { phase: Phase::Test },
            },
            cleanup: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["result"], "error");
        assert_eq!(json["outcome"]["cause"]["kind"], "timed_out");
        assert_eq!(json["outcome"]["cause"]["phase"], "test");
        assert!(json.get("cleanup").is_none());
    }
}
