//! In-process isolation.
//!
//! Runs every phase on the runner's own thread behind `catch_unwind`. Panics
//! are contained and reported like a crashed child; a genuine crash (signal,
//! `process::exit`) takes the whole runner down. Used where `fork` is not
//! available or not wanted.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use super::{Isolation, Phase, StatusChannel, TestRun, Termination};
use crate::error::RunError;
use crate::status::Status;
use crate::suite::{Procedure, TestCase};

/// Runs each phase in the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessIsolation;

impl InProcessIsolation {
    pub fn new() -> Self {
        Self
    }
}

impl Isolation for InProcessIsolation {
    fn name(&self) -> &'static str {
        "in_process"
    }

    fn run_procedure(&self, phase: Phase, procedure: Procedure) -> Result<Termination, RunError> {
        let termination = match panic::catch_unwind(procedure) {
            Ok(()) => Termination::Exited(0),
            Err(_) => Termination::Panicked,
        };
        debug!(%phase, ?termination, "Procedure finished in process");
        Ok(termination)
    }

    fn run_test(&self, case: &TestCase) -> Result<TestRun, RunError> {
        let mut status = Status::default();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = case.invoke(&mut status);
        }));

        let run = match outcome {
            Ok(()) => TestRun {
                termination: Termination::Exited(0),
                channel: StatusChannel::Ready(status),
            },
            Err(_) => TestRun {
                termination: Termination::Panicked,
                channel: StatusChannel::Closed,
            },
        };
        debug!(test = case.name(), termination = ?run.termination, "Test finished in process");
        Ok(run)
    }
}
