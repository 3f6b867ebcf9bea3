//! Result reporting.
//!
//! The runner notifies a [`Reporter`] as a suite progresses. Reporters only
//! observe; they never influence classification or the returned
//! [`SuiteReport`].
//!
//! # Implementations
//!
//! - `ConsoleReporter`: human readable blocks and a percentage summary
//! - `JsonReporter`: one JSON object per event
//! - `TracingReporter`: structured `tracing` events
//! - `NullReporter`: discards everything

use crate::config::ReportFormat;
use crate::runner::{SuiteReport, TestReport};

mod console;
mod json;
mod trace;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use trace::TracingReporter;

/// Observer of suite progress.
pub trait Reporter {
    /// A suite is about to run `total` tests.
    fn suite_started(&mut self, suite: &str, total: usize);

    /// One test has been classified.
    fn test_finished(&mut self, suite: &str, report: &TestReport);

    /// Every test of the suite has run.
    fn suite_finished(&mut self, report: &SuiteReport);
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn suite_started(&mut self, _suite: &str, _total: usize) {}

    fn test_finished(&mut self, _suite: &str, _report: &TestReport) {}

    fn suite_finished(&mut self, _report: &SuiteReport) {}
}

/// Create the stdout reporter for a configured format.
pub fn for_format(format: ReportFormat) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Console => Box::new(ConsoleReporter::stdout()),
        ReportFormat::Json => Box::new(JsonReporter::stdout()),
        ReportFormat::Tracing => Box::new(TracingReporter),
    }
}
