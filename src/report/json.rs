//! Line-delimited JSON report.

use std::io::{self, Write};

use serde::Serialize;
use tracing::warn;

use super::Reporter;
use crate::runner::{SuiteReport, Tally, TestReport};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    SuiteStarted {
        suite: &'a str,
        total: usize,
    },
    TestFinished {
        suite: &'a str,
        test: &'a TestReport,
    },
    SuiteFinished {
        suite: &'a str,
        tally: Tally,
    },
}

/// Writes one JSON object per line for every reporter event.
#[derive(Debug)]
pub struct JsonReporter<W: Write> {
    writer: W,
}

impl JsonReporter<io::Stdout> {
    /// Reporter writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, event: &Event<'_>) {
        let written = serde_json::to_writer(&mut self.writer, event)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush());
        if let Err(e) = written {
            warn!(error = %e, "Failed to write JSON report");
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn suite_started(&mut self, suite: &str, total: usize) {
        self.emit(&Event::SuiteStarted { suite, total });
    }

    fn test_finished(&mut self, suite: &str, report: &TestReport) {
        self.emit(&Event::TestFinished {
            suite,
            test: report,
        });
    }

    fn suite_finished(&mut self, report: &SuiteReport) {
        self.emit(&Event::SuiteFinished {
            suite: &report.name,
            tally: report.tally(),
        });
    }
}
