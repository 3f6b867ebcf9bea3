//! Suite execution step definitions.

use std::time::Duration;

use cucumber::{given, then, when, World};
use forkcase::isolation::{ForkIsolation, Phase};
use forkcase::{
    check, check_array_eq, check_eq, ErrorCause, NullReporter, Outcome, Procedure, Runner,
    Status, Suite, SuiteReport, TestReport, Verdict,
};

/// Test context for suite execution scenarios.
///
/// The suite is described as data and only built when it runs, since test
/// bodies are not `Send`.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct SuiteWorld {
    suite_name: String,
    before: Option<String>,
    after: Option<String>,
    tests: Vec<(String, String)>,
    report: Option<SuiteReport>,
}

impl SuiteWorld {
    fn new() -> Self {
        Self {
            suite_name: String::new(),
            before: None,
            after: None,
            tests: Vec::new(),
            report: None,
        }
    }

    fn build(&self) -> Suite {
        let mut suite = Suite::new(
            &self.suite_name,
            self.before.as_deref().map(procedure),
            self.after.as_deref().map(procedure),
        );
        for (name, behavior) in &self.tests {
            register(&mut suite, name, behavior);
        }
        suite
    }

    fn run(&mut self, timeout: Option<Duration>) {
        let suite = self.build();
        let runner = Runner::with_isolation(ForkIsolation::new(timeout));
        let report = runner
            .run(&suite, &mut NullReporter)
            .expect("Runner failed");
        self.report = Some(report);
    }

    fn report(&self) -> &SuiteReport {
        self.report.as_ref().expect("Suite has not run")
    }

    fn test(&self, name: &str) -> &TestReport {
        self.report()
            .tests
            .iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("No report for test {:?}", name))
    }

    fn cause(&self, name: &str) -> &ErrorCause {
        match &self.test(name).outcome {
            Outcome::Error { cause } => cause,
            other => panic!("Test {:?} is not an error: {:?}", name, other),
        }
    }
}

fn segfault() {
    let _ = unsafe { std::ptr::read_volatile(8 as *const u8) };
}

fn succeed() {}

fn abort() {
    std::process::abort();
}

fn explode() {
    panic!("procedure panicked");
}

fn procedure(behavior: &str) -> Procedure {
    match behavior {
        "succeeds" => succeed,
        "segfaults" => segfault,
        "aborts" => abort,
        "panics" => explode,
        other => panic!("Unknown procedure behavior {:?}", other),
    }
}

fn register(suite: &mut Suite, name: &str, behavior: &str) {
    if let Some(code) = behavior.strip_prefix("exits ") {
        let code: i32 = code.parse().expect("Exit status must be a number");
        suite.register(move |_: &mut Status| -> Verdict { std::process::exit(code) }, name);
        return;
    }
    match behavior {
        "passes" => suite.register(
            |s: &mut Status| -> Verdict {
                check!(s, 1 + 1 == 2, "arithmetic");
                Ok(())
            },
            name,
        ),
        "fails" => suite.register(
            |s: &mut Status| -> Verdict {
                check_eq!(s, 6 * 9, 42, "answer");
                Ok(())
            },
            name,
        ),
        "misuses" => suite.register(
            |s: &mut Status| -> Verdict {
                check_array_eq!(s, [1, 2], [1, 2], 0, "no elements");
                Ok(())
            },
            name,
        ),
        "segfaults" => suite.register(
            |_: &mut Status| -> Verdict {
                segfault();
                Ok(())
            },
            name,
        ),
        "aborts" => suite.register(|_: &mut Status| -> Verdict { std::process::abort() }, name),
        "panics" => suite.register(|_: &mut Status| -> Verdict { panic!("test panicked") }, name),
        "hangs" => suite.register(
            |_: &mut Status| -> Verdict {
                loop {
                    std::thread::sleep(Duration::from_secs(1));
                }
            },
            name,
        ),
        other => panic!("Unknown test behavior {:?}", other),
    };
}

// --- Given steps ---

#[given(expr = "a suite named {string}")]
fn given_suite(world: &mut SuiteWorld, name: String) {
    world.suite_name = name;
}

#[given(expr = "a before procedure that {word}")]
fn given_before(world: &mut SuiteWorld, behavior: String) {
    world.before = Some(behavior);
}

#[given(expr = "an after procedure that {word}")]
fn given_after(world: &mut SuiteWorld, behavior: String) {
    world.after = Some(behavior);
}

#[given(expr = "a test {string} that {word}")]
fn given_test(world: &mut SuiteWorld, name: String, behavior: String) {
    world.tests.push((name, behavior));
}

#[given(expr = "a test {string} that misuses an assertion")]
fn given_misusing_test(world: &mut SuiteWorld, name: String) {
    world.tests.push((name, "misuses".to_string()));
}

#[given(expr = "a test {string} that exits with status {int}")]
fn given_exiting_test(world: &mut SuiteWorld, name: String, code: i32) {
    world.tests.push((name, format!("exits {}", code)));
}

// --- When steps ---

#[when("the suite runs")]
fn when_suite_runs(world: &mut SuiteWorld) {
    world.run(None);
}

#[when(expr = "the suite runs with a {int} ms timeout")]
fn when_suite_runs_with_timeout(world: &mut SuiteWorld, millis: u64) {
    world.run(Some(Duration::from_millis(millis)));
}

// --- Then steps ---

#[then(expr = "the tally is {int} total, {int} successes, {int} failures and {int} errors")]
fn then_tally(world: &mut SuiteWorld, total: usize, successes: usize, failures: usize, errors: usize) {
    let tally = world.report().tally();
    assert_eq!(
        (tally.total, tally.successes, tally.failures, tally.errors),
        (total, successes, failures, errors)
    );
}

#[then("the suite reports no tests")]
fn then_no_tests(world: &mut SuiteWorld) {
    assert!(world.report().tests.is_empty());
}

#[then(expr = "test {string} is a success")]
fn then_success(world: &mut SuiteWorld, name: String) {
    assert_eq!(world.test(&name).outcome, Outcome::Success);
}

#[then(expr = "test {string} is a failure")]
fn then_failure(world: &mut SuiteWorld, name: String) {
    assert!(world.test(&name).outcome.is_failure());
}

#[then(expr = "test {string} is an invalid assertion")]
fn then_invalid(world: &mut SuiteWorld, name: String) {
    assert!(matches!(
        world.cause(&name),
        ErrorCause::InvalidAssertion { .. }
    ));
}

#[then(expr = "test {string} is an error caused by signal {int}")]
fn then_signaled(world: &mut SuiteWorld, name: String, signal: i32) {
    assert_eq!(
        world.cause(&name),
        &ErrorCause::Signaled {
            phase: Phase::Test,
            signal
        }
    );
}

#[then(expr = "test {string} is an error caused by a panic")]
fn then_panicked(world: &mut SuiteWorld, name: String) {
    assert_eq!(world.cause(&name), &ErrorCause::Panicked { phase: Phase::Test });
}

#[then(expr = "test {string} is an error with exit status {int}")]
fn then_exited(world: &mut SuiteWorld, name: String, code: i32) {
    assert_eq!(
        world.cause(&name),
        &ErrorCause::Exited {
            phase: Phase::Test,
            code
        }
    );
}

#[then(expr = "test {string} is an error in the before procedure")]
fn then_setup_error(world: &mut SuiteWorld, name: String) {
    assert_eq!(world.cause(&name).phase(), Phase::Setup);
}

#[then(expr = "test {string} timed out")]
fn then_timed_out(world: &mut SuiteWorld, name: String) {
    assert_eq!(world.cause(&name), &ErrorCause::TimedOut { phase: Phase::Test });
}

#[then(expr = "test {string} has a cleanup error")]
fn then_cleanup(world: &mut SuiteWorld, name: String) {
    let cleanup = world.test(&name).cleanup.as_ref();
    assert!(matches!(
        cleanup,
        Some(cause) if cause.phase() == Phase::Teardown
    ));
}
