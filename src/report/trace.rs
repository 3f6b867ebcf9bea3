//! Reporter emitting `tracing` events.

use tracing::{info, warn};

use super::Reporter;
use crate::runner::{Outcome, SuiteReport, TestReport};

/// Reports progress as structured log events instead of text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn suite_started(&mut self, suite: &str, total: usize) {
        info!(suite, total, "Suite started");
    }

    fn test_finished(&mut self, suite: &str, report: &TestReport) {
        if let Some(cause) = &report.cleanup {
            warn!(suite, test = %report.name, %cause, "Cleanup error");
        }
        match &report.outcome {
            Outcome::Success => info!(suite, test = %report.name, "Test passed"),
            Outcome::Failure { assertion } => {
                warn!(suite, test = %report.name, assertion = %assertion, "Assertion failure")
            }
            Outcome::Error { cause } => warn!(suite, test = %report.name, %cause, "Test error"),
        }
    }

    fn suite_finished(&mut self, report: &SuiteReport) {
        let tally = report.tally();
        info!(
            suite = %report.name,
            total = tally.total,
            successes = tally.successes,
            failures = tally.failures,
            errors = tally.errors,
            "Suite finished"
        );
    }
}
