//! Suite registry.
//!
//! A [`Suite`] is a named, ordered collection of [`TestCase`]s plus optional
//! before/after procedures. Tests are stored in registration order and the
//! runner executes them in that order.

use std::fmt;

use forkcase_list::{Iter, List};

use crate::error::RunError;
use crate::report::ConsoleReporter;
use crate::runner::{Runner, SuiteReport};
use crate::status::{Status, Verdict};
use crate::utils::text::truncate_utf8;

/// Maximum length of suite and test names, in bytes.
pub const NAME_LEN: usize = 100;

/// Setup or teardown procedure. Failure is signaled only by panicking,
/// exiting, or dying from a signal.
pub type Procedure = fn();

/// Boxed test body.
pub type TestFn = Box<dyn Fn(&mut Status) -> Verdict>;

/// A named test registered in a suite.
pub struct TestCase {
    name: String,
    function: TestFn,
}

impl TestCase {
    /// Create a test case. The name is truncated to [`NAME_LEN`] bytes.
    pub fn new<F>(name: &str, function: F) -> Self
    where
        F: Fn(&mut Status) -> Verdict + 'static,
    {
        Self {
            name: truncate_utf8(name, NAME_LEN).to_string(),
            function: Box::new(function),
        }
    }

    /// Human readable test name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the test body against `status`.
    pub fn invoke(&self, status: &mut Status) -> Verdict {
        (self.function)(status)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// A named suite of test cases.
pub struct Suite {
    name: String,
    tests: List<TestCase>,
    before: Option<Procedure>,
    after: Option<Procedure>,
}

impl Suite {
    /// Create an empty suite with optional before/after procedures.
    pub fn new(name: &str, before: Option<Procedure>, after: Option<Procedure>) -> Self {
        Self {
            name: truncate_utf8(name, NAME_LEN).to_string(),
            tests: List::new(),
            before,
            after,
        }
    }

    /// Create an empty suite without procedures.
    pub fn named(name: &str) -> Self {
        Self::new(name, None, None)
    }

    /// Set the procedure run before each test.
    pub fn with_before(mut self, before: Procedure) -> Self {
        self.before = Some(before);
        self
    }

    /// Set the procedure run after each test.
    pub fn with_after(mut self, after: Procedure) -> Self {
        self.after = Some(after);
        self
    }

    /// Register a test case after those already registered.
    pub fn register<F>(&mut self, function: F, name: &str) -> &mut Self
    where
        F: Fn(&mut Status) -> Verdict + 'static,
    {
        self.tests.push_back(TestCase::new(name, function));
        self
    }

    /// Suite name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// True when no tests are registered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Registered tests, in registration order.
    pub fn tests(&self) -> Iter<'_, TestCase> {
        self.tests.iter()
    }

    /// Procedure run before each test, if any.
    pub fn before(&self) -> Option<Procedure> {
        self.before
    }

    /// Procedure run after each test, if any.
    pub fn after(&self) -> Option<Procedure> {
        self.after
    }

    /// Run the suite with the default runner, reporting to stdout.
    pub fn run(&self) -> Result<SuiteReport, RunError> {
        let mut reporter = ConsoleReporter::stdout();
        Runner::default().run(self, &mut reporter)
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("tests", &self.tests)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}
