//! Isolated execution backends.
//!
//! The runner drives every setup, test and teardown phase through an
//! [`Isolation`] backend and only sees how the phase terminated plus, for
//! tests, the channel carrying the transmitted [`Status`].
//!
//! # Implementations
//!
//! - `ForkIsolation`: one forked child per phase, status over a pipe (unix)
//! - `InProcessIsolation`: `catch_unwind` guard in the runner's own process;
//!   contains panics but not crashes

use std::fmt;
use std::fs::File;

use serde::Serialize;

use crate::error::RunError;
use crate::status::Status;
use crate::suite::{Procedure, TestCase};
use crate::wire::{self, WireError};

#[cfg(unix)]
mod fork;
mod in_process;

#[cfg(unix)]
pub use fork::ForkIsolation;
pub use in_process::InProcessIsolation;

/// Exit code used by an isolated child whose code panicked.
pub const PANIC_EXIT_CODE: i32 = 101;

/// Execution phase of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Test,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "before procedure",
            Phase::Test => "test",
            Phase::Teardown => "after procedure",
        })
    }
}

/// How an isolated phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited with the given code.
    Exited(i32),
    /// Killed by the given signal number.
    Signaled(i32),
    /// User code panicked.
    Panicked,
    /// Exceeded the phase timeout and was killed.
    TimedOut,
}

impl Termination {
    /// Normal termination with exit code 0.
    pub fn is_clean(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }
}

/// Where the parent collects a test's transmitted status from.
#[derive(Debug)]
pub enum StatusChannel {
    /// Read end of the per-test pipe.
    Pipe(File),
    /// Status produced without crossing a process boundary.
    Ready(Status),
    /// Nothing was transmitted.
    Closed,
}

impl StatusChannel {
    /// Consume the channel and return the status it carries.
    pub fn collect(self) -> Result<Status, WireError> {
        match self {
            StatusChannel::Pipe(mut reader) => wire::read_record(&mut reader),
            StatusChannel::Ready(status) => Ok(status),
            StatusChannel::Closed => Err(WireError::Truncated),
        }
    }
}

/// Result of running a test body in isolation.
#[derive(Debug)]
pub struct TestRun {
    pub termination: Termination,
    pub channel: StatusChannel,
}

/// Backend that runs user code in a fault-isolated context.
///
/// Both methods block until the phase has terminated. Errors are fatal for
/// the whole run; crashes of user code are reported through
/// [`Termination`] instead.
pub trait Isolation {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Run a before or after procedure.
    fn run_procedure(&self, phase: Phase, procedure: Procedure) -> Result<Termination, RunError>;

    /// Run a test body against a fresh [`Status`].
    fn run_test(&self, case: &TestCase) -> Result<TestRun, RunError>;
}

/// Conventional name of a signal number, e.g. `SIGSEGV`.
#[cfg(unix)]
pub fn signal_name(signal: i32) -> &'static str {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str())
        .unwrap_or("unknown signal")
}

/// Conventional name of a signal number.
#[cfg(not(unix))]
pub fn signal_name(_signal: i32) -> &'static str {
    "unknown signal"
}
