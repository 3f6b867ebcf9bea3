//! Per-test assertion status.
//!
//! A [`Status`] is created fresh for every test invocation and is the only
//! channel through which a test body reports its outcome. Every assertion
//! primitive records what it checked, evaluates, and returns a [`Verdict`].
//! A failed (or malformed) assertion returns `Err(Abort)`, so a test body
//! written with `?` stops at the first failing check.

use std::fmt;

use serde::Serialize;

use crate::predicates::{self, Approx};

/// Outcome record for one test invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Description of the most recently evaluated assertion.
    pub assertion: String,
    /// True when the most recent assertion evaluated false.
    pub failed: bool,
    /// Set when an assertion was used with invalid arguments.
    pub invalid: Option<String>,
}

/// Marker returned by an assertion that ends the test body early.
///
/// Only [`Status`] can produce it, so `Err(Abort)` always means the status
/// carries a failure or an invalid-assertion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort(());

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("test aborted by assertion")
    }
}

/// Return type of test functions and assertion primitives.
pub type Verdict = Result<(), Abort>;

impl Status {
    /// Create an empty status (nothing asserted yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the last assertion was used with invalid arguments.
    pub fn is_invalid(&self) -> bool {
        self.invalid.is_some()
    }

    /// Store the description of the check about to be evaluated.
    fn begin(&mut self, description: impl Into<String>) {
        self.assertion = description.into();
    }

    /// Record the result of a well-formed assertion.
    pub(crate) fn record(&mut self, failed: bool) {
        self.failed = failed;
        self.invalid = None;
    }

    /// Record a precondition violation; the comparison is not evaluated.
    pub(crate) fn reject(&mut self, message: String) {
        self.failed = false;
        self.invalid = Some(message);
    }

    fn verdict(&self) -> Verdict {
        if self.failed || self.invalid.is_some() {
            Err(Abort(()))
        } else {
            Ok(())
        }
    }

    /// Assert that `condition` holds.
    pub fn assert_true(&mut self, condition: bool, description: impl Into<String>) -> Verdict {
        self.begin(description);
        self.record(!condition);
        self.verdict()
    }

    /// Assert that `condition` does not hold.
    pub fn assert_false(&mut self, condition: bool, description: impl Into<String>) -> Verdict {
        self.begin(description);
        self.record(condition);
        self.verdict()
    }

    /// Assert exact equality of two scalars.
    pub fn assert_equals<T: PartialEq>(
        &mut self,
        x: T,
        y: T,
        description: impl Into<String>,
    ) -> Verdict {
        self.begin(description);
        self.record(x != y);
        self.verdict()
    }

    /// Assert `|x - y| < tol`. A non-positive tolerance is invalid.
    pub fn assert_approx<T: Approx>(
        &mut self,
        x: T,
        y: T,
        tol: T,
        description: impl Into<String>,
    ) -> Verdict {
        self.begin(description);
        predicates::approx_eq(x, y, tol, self);
        self.verdict()
    }

    /// Assert two strings are equal.
    pub fn assert_str_equals(&mut self, x: &str, y: &str, description: impl Into<String>) -> Verdict {
        self.begin(description);
        self.record(x != y);
        self.verdict()
    }

    /// Assert an optional value is absent.
    pub fn assert_none<T>(&mut self, value: &Option<T>, description: impl Into<String>) -> Verdict {
        self.begin(description);
        self.record(value.is_some());
        self.verdict()
    }

    /// Assert an optional value is present.
    pub fn assert_some<T>(&mut self, value: &Option<T>, description: impl Into<String>) -> Verdict {
        self.begin(description);
        self.record(value.is_none());
        self.verdict()
    }

    /// Assert the first `len` elements of two arrays are equal.
    pub fn assert_array_equals<T: PartialEq>(
        &mut self,
        x: &[T],
        y: &[T],
        len: usize,
        description: impl Into<String>,
    ) -> Verdict {
        self.begin(description);
        predicates::array_eq(x, y, len, self);
        self.verdict()
    }

    /// Assert the first `len` elements of two float arrays differ by at most `tol`.
    pub fn assert_array_approx<T: Approx>(
        &mut self,
        x: &[T],
        y: &[T],
        len: usize,
        tol: T,
        description: impl Into<String>,
    ) -> Verdict {
        self.begin(description);
        predicates::array_approx(x, y, len, tol, self);
        self.verdict()
    }

    /// Assert the leading `rows x cols` block of two matrices is equal.
    pub fn assert_matrix_equals<T, R>(
        &mut self,
        x: &[R],
        y: &[R],
        rows: usize,
        cols: usize,
        description: impl Into<String>,
    ) -> Verdict
    where
        T: PartialEq,
        R: AsRef<[T]>,
    {
        self.begin(description);
        predicates::matrix_eq(x, y, rows, cols, self);
        self.verdict()
    }

    /// Assert the leading `rows x cols` block of two float matrices differs
    /// by at most `tol` element-wise.
    pub fn assert_matrix_approx<T, R>(
        &mut self,
        x: &[R],
        y: &[R],
        rows: usize,
        cols: usize,
        tol: T,
        description: impl Into<String>,
    ) -> Verdict
    where
        T: Approx,
        R: AsRef<[T]>,
    {
        self.begin(description);
        predicates::matrix_approx(x, y, rows, cols, tol, self);
        self.verdict()
    }

    /// Fail the test unconditionally.
    pub fn fail(&mut self, message: impl fmt::Display) -> Verdict {
        self.assertion = format!("Reached a fail() statement: {}", message);
        self.failed = true;
        self.invalid = None;
        Err(Abort(()))
    }
}
