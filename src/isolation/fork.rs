//! Fork-based isolation.
//!
//! Every phase runs in a freshly forked child. A test child encodes its
//! status into one fixed-size record, writes it to a pipe created just for
//! that test, and exits. The parent classifies the child's termination with
//! `waitpid` and reads the record afterwards.
//!
//! Pipes handed to a child close on exec and are read without blocking once
//! the child has been reaped. Whatever the child wrote is in the pipe by then,
//! so a helper process that inherited a write end cannot stall the parent.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, pipe, ForkResult, Pid};
use tracing::{debug, warn};

use super::{Isolation, Phase, StatusChannel, TestRun, Termination, PANIC_EXIT_CODE};
use crate::error::RunError;
use crate::status::Status;
use crate::suite::{Procedure, TestCase};
use crate::wire;

/// How often a child is polled while a phase timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Runs each phase in a forked child process.
#[derive(Debug, Clone, Default)]
pub struct ForkIsolation {
    timeout: Option<Duration>,
}

impl ForkIsolation {
    /// Create a backend. With `timeout` set, a phase running longer is
    /// killed with SIGKILL and reported as timed out.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Phase timeout, if armed.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Wait for `child` to terminate and classify how it ended.
    ///
    /// A child that exited after its body panicked is reported as
    /// `Panicked` whatever its exit code.
    fn reap(&self, child: Child, phase: Phase) -> Result<Termination, RunError> {
        let termination = self.wait(child.pid, phase)?;
        Ok(match termination {
            Termination::Exited(_) if child.panicked() => Termination::Panicked,
            other => other,
        })
    }

    fn wait(&self, child: Pid, phase: Phase) -> Result<Termination, RunError> {
        let mut deadline = self.timeout.map(|limit| Instant::now() + limit);
        let mut killed = false;

        loop {
            let flags = deadline.map(|_| WaitPidFlag::WNOHANG);
            match waitpid(child, flags) {
                Ok(WaitStatus::StillAlive) => {
                    if deadline.is_some_and(|limit| Instant::now() >= limit) {
                        warn!(pid = %child, %phase, "Child exceeded phase timeout, killing");
                        match kill(child, Signal::SIGKILL) {
                            Ok(()) | Err(Errno::ESRCH) => {}
                            Err(e) => {
                                return Err(RunError::Kill {
                                    pid: child.as_raw(),
                                    source: e.into(),
                                })
                            }
                        }
                        killed = true;
                        deadline = None;
                        continue;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Ok(status) => {
                    if let Some(termination) = classify(status) {
                        debug!(pid = %child, %phase, ?termination, "Reaped child");
                        return Ok(if killed {
                            Termination::TimedOut
                        } else {
                            termination
                        });
                    }
                }
                Err(Errno::EINTR) => {}
                Err(e) => {
                    return Err(RunError::Wait {
                        pid: child.as_raw(),
                        source: e.into(),
                    })
                }
            }
        }
    }
}

impl Isolation for ForkIsolation {
    fn name(&self) -> &'static str {
        "fork"
    }

    fn run_procedure(&self, phase: Phase, procedure: Procedure) -> Result<Termination, RunError> {
        let child = spawn(phase, || {
            procedure();
            0
        })?;
        self.reap(child, phase)
    }

    fn run_test(&self, case: &TestCase) -> Result<TestRun, RunError> {
        let (reader, writer) = child_pipe()?;

        let child = spawn(Phase::Test, || {
            let mut status = Status::default();
            // Early return already happened inside the body; the outcome
            // lives in `status`.
            let _ = case.invoke(&mut status);
            let mut sink = &writer;
            if let Err(e) = wire::write_record(&mut sink, &status) {
                eprintln!("forkcase: failed to send status for {:?}: {}", case.name(), e);
            }
            0
        })?;

        drop(writer);

        let termination = self.reap(child, Phase::Test)?;
        Ok(TestRun {
            termination,
            channel: StatusChannel::Pipe(reader),
        })
    }
}

/// A forked child and the read end of its panic notice pipe.
struct Child {
    pid: Pid,
    panic_notice: File,
}

impl Child {
    /// True when the child reported a panic before exiting. Only meaningful
    /// after the child has been reaped.
    fn panicked(&self) -> bool {
        let mut flag = [0u8; 1];
        matches!((&self.panic_notice).read(&mut flag), Ok(1))
    }
}

/// Pipe for talking to one child: both ends close on exec and the read end
/// never blocks.
fn child_pipe() -> Result<(File, File), RunError> {
    let (reader, writer) = pipe().map_err(|e| RunError::Pipe(e.into()))?;
    fcntl(reader.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(|e| RunError::Pipe(e.into()))?;
    fcntl(writer.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(|e| RunError::Pipe(e.into()))?;
    fcntl(reader.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
        .map_err(|e| RunError::Pipe(e.into()))?;
    Ok((File::from(reader), File::from(writer)))
}

/// Fork a child that runs `body` and exits with its return code.
///
/// The child never returns into the caller: it leaves through `_exit`, so it
/// neither continues the suite loop nor runs the parent's exit handlers. A
/// panicking body writes one byte to the panic notice pipe and exits with
/// [`PANIC_EXIT_CODE`].
fn spawn<F>(phase: Phase, body: F) -> Result<Child, RunError>
where
    F: FnOnce() -> i32,
{
    let (panic_notice, notify) = child_pipe()?;

    // Unflushed output would otherwise be written by both processes.
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    // Safety: the child only runs `body` and then calls `_exit`; it never
    // returns into code that assumes the parent's other threads exist.
    match unsafe { fork() }.map_err(|e| RunError::Fork(e.into()))? {
        ForkResult::Parent { child } => {
            debug!(pid = %child, %phase, "Forked isolated child");
            drop(notify);
            Ok(Child {
                pid: child,
                panic_notice,
            })
        }
        ForkResult::Child => {
            let code = match panic::catch_unwind(AssertUnwindSafe(body)) {
                Ok(code) => code,
                Err(_) => {
                    let _ = (&notify).write_all(&[1]);
                    PANIC_EXIT_CODE
                }
            };
            let _ = io::stdout().flush();
            let _ = io::stderr().flush();
            // Safety: `_exit` is async-signal-safe and does not return.
            unsafe { nix::libc::_exit(code) }
        }
    }
}

/// Map a wait status to a termination; `None` for non-terminal states.
fn classify(status: WaitStatus) -> Option<Termination> {
    match status {
        WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
        WaitStatus::Signaled(_, signal, _) => Some(Termination::Signaled(signal as i32)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exit_codes() {
        let pid = Pid::from_raw(42);
        assert_eq!(
            classify(WaitStatus::Exited(pid, 0)),
            Some(Termination::Exited(0))
        );
        assert_eq!(
            classify(WaitStatus::Exited(pid, 3)),
            Some(Termination::Exited(3))
        );
        // A panic is reported through the notice pipe, never by exit code.
        assert_eq!(
            classify(WaitStatus::Exited(pid, PANIC_EXIT_CODE)),
            Some(Termination::Exited(PANIC_EXIT_CODE))
        );
    }

    #[test]
    fn test_child_pipe_reads_without_blocking() {
        let (reader, writer) = child_pipe().unwrap();
        let mut buf = [0u8; 4];
        let err = (&reader).read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        (&writer).write_all(b"ok").unwrap();
        assert_eq!((&reader).read(&mut buf).unwrap(), 2);

        let flags = fcntl(writer.as_raw_fd(), FcntlArg::F_GETFD).unwrap();
        assert!(FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));
    }

    #[test]
    fn test_classify_signals() {
        let pid = Pid::from_raw(42);
        assert_eq!(
            classify(WaitStatus::Signaled(pid, Signal::SIGSEGV, true)),
            Some(Termination::Signaled(Signal::SIGSEGV as i32))
        );
        assert_eq!(classify(WaitStatus::StillAlive), None);
        assert_eq!(
            classify(WaitStatus::Stopped(pid, Signal::SIGSTOP)),
            None
        );
    }

    #[test]
    fn test_timeout_is_kept() {
        let isolation = ForkIsolation::new(Some(Duration::from_millis(250)));
        assert_eq!(isolation.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(ForkIsolation::default().timeout(), None);
        assert_eq!(isolation.name(), "fork");
    }
}
