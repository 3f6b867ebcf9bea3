//! Human readable console report.

use std::fmt;
use std::io::{self, Write};

use tracing::warn;

use super::Reporter;
use crate::isolation::Phase;
use crate::runner::{ErrorCause, Outcome, SuiteReport, Tally, TestReport};

/// Writes per-test failure blocks and a suite summary.
///
/// Successful tests print nothing. A suite summary looks like:
///
/// ```text
/// Suite "math" execution complete:
///  3 successes (75.00%)
///  1 failure   (25.00%)
///  0 errors    ( 0.00%)
/// ```
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    writer: W,
}

impl ConsoleReporter<io::Stdout> {
    /// Reporter writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.writer.write_fmt(args) {
            warn!(error = %e, "Failed to write console report");
        }
    }

    fn error_block(&mut self, suite: &str, test: &str, heading: &str, cause: &ErrorCause) {
        match cause {
            ErrorCause::InvalidAssertion { assertion, message } => self.emit(format_args!(
                "Suite \"{}\", test case \"{}\", invalid assertion:\n  {}\n  {}\n\n",
                suite, test, assertion, message
            )),
            cause if cause.phase() == Phase::Setup => self.emit(format_args!(
                "Suite \"{}\", test case \"{}\", {}:\n  {}.  Test case execution aborted.\n\n",
                suite, test, heading, cause
            )),
            cause => self.emit(format_args!(
                "Suite \"{}\", test case \"{}\", {}:\n  {}.\n\n",
                suite, test, heading, cause
            )),
        }
    }

    fn summary(&mut self, name: &str, tally: &Tally) {
        let width = if [tally.successes, tally.failures, tally.errors].contains(&tally.total) {
            6
        } else {
            5
        };
        self.emit(format_args!(
            "\nSuite \"{}\" execution complete:\n \
             {} success{} ({:>w$.2}%)\n \
             {} failure{}  ({:>w$.2}%)\n \
             {} error{}    ({:>w$.2}%)\n",
            name,
            tally.successes,
            if tally.successes == 1 { "  " } else { "es" },
            tally.percentage(tally.successes),
            tally.failures,
            if tally.failures == 1 { " " } else { "s" },
            tally.percentage(tally.failures),
            tally.errors,
            if tally.errors == 1 { " " } else { "s" },
            tally.percentage(tally.errors),
            w = width,
        ));
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn suite_started(&mut self, suite: &str, _total: usize) {
        self.emit(format_args!("** Starting suite \"{}\" **\n", suite));
    }

    fn test_finished(&mut self, suite: &str, report: &TestReport) {
        if let Some(cause) = &report.cleanup {
            self.error_block(suite, &report.name, "error on cleanup", cause);
        }
        match &report.outcome {
            Outcome::Success => {}
            Outcome::Failure { assertion } => self.emit(format_args!(
                "Suite \"{}\", test case \"{}\", assertion failure:\n  {}\n\n",
                suite, report.name, assertion
            )),
            Outcome::Error { cause } => self.error_block(suite, &report.name, "error", cause),
        }
    }

    fn suite_finished(&mut self, report: &SuiteReport) {
        if report.tests.is_empty() {
            self.emit(format_args!(
                "  Suite \"{}\" does not contain any test case.\n",
                report.name
            ));
        } else {
            self.summary(&report.name, &report.tally());
        }
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "Failed to flush console report");
        }
    }
}
