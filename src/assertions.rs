//! Assertion macros.
//!
//! Thin wrappers over the [`Status`](crate::Status) primitives that record
//! the assertion exactly as written (`check_eq(a, b, "msg")`) and apply `?`,
//! so the enclosing test function must return a [`Verdict`](crate::Verdict).
//!
//! ```
//! use forkcase::{check, check_eq, Status, Verdict};
//!
//! fn addition(s: &mut Status) -> Verdict {
//!     let sum = 2 + 2;
//!     check!(s, sum > 0, "sum is positive");
//!     check_eq!(s, sum, 4, "two plus two");
//!     Ok(())
//! }
//!
//! let mut status = Status::new();
//! assert!(addition(&mut status).is_ok());
//! ```

/// Assert a condition is true.
#[macro_export]
macro_rules! check {
    ($s:expr, $cond:expr, $msg:expr $(,)?) => {
        $s.assert_true(
            $cond,
            concat!("check(", stringify!($cond), ", ", stringify!($msg), ")"),
        )?
    };
}

/// Assert a condition is false.
#[macro_export]
macro_rules! check_false {
    ($s:expr, $cond:expr, $msg:expr $(,)?) => {
        $s.assert_false(
            $cond,
            concat!("check_false(", stringify!($cond), ", ", stringify!($msg), ")"),
        )?
    };
}

/// Assert two scalars are equal.
#[macro_export]
macro_rules! check_eq {
    ($s:expr, $x:expr, $y:expr, $msg:expr $(,)?) => {
        $s.assert_equals(
            $x,
            $y,
            concat!(
                "check_eq(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Assert two floats differ by less than a positive tolerance.
#[macro_export]
macro_rules! check_approx {
    ($s:expr, $x:expr, $y:expr, $tol:expr, $msg:expr $(,)?) => {
        $s.assert_approx(
            $x,
            $y,
            $tol,
            concat!(
                "check_approx(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($tol),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Assert two strings are equal.
#[macro_export]
macro_rules! check_str_eq {
    ($s:expr, $x:expr, $y:expr, $msg:expr $(,)?) => {
        $s.assert_str_equals(
            $x,
            $y,
            concat!(
                "check_str_eq(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Assert an `Option` is `None`.
#[macro_export]
macro_rules! check_none {
    ($s:expr, $x:expr, $msg:expr $(,)?) => {
        $s.assert_none(
            &$x,
            concat!("check_none(", stringify!($x), ", ", stringify!($msg), ")"),
        )?
    };
}

/// Assert an `Option` is `Some`.
#[macro_export]
macro_rules! check_some {
    ($s:expr, $x:expr, $msg:expr $(,)?) => {
        $s.assert_some(
            &$x,
            concat!("check_some(", stringify!($x), ", ", stringify!($msg), ")"),
        )?
    };
}

/// Assert the first `len` elements of two arrays are equal.
#[macro_export]
macro_rules! check_array_eq {
    ($s:expr, $x:expr, $y:expr, $len:expr, $msg:expr $(,)?) => {
        $s.assert_array_equals(
            &$x[..],
            &$y[..],
            $len,
            concat!(
                "check_array_eq(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($len),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Assert the first `len` elements of two float arrays are within `tol`.
#[macro_export]
macro_rules! check_array_approx {
    ($s:expr, $x:expr, $y:expr, $len:expr, $tol:expr, $msg:expr $(,)?) => {
        $s.assert_array_approx(
            &$x[..],
            &$y[..],
            $len,
            $tol,
            concat!(
                "check_array_approx(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($len),
                ", ",
                stringify!($tol),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Assert the leading `rows x cols` block of two matrices is equal.
#[macro_export]
macro_rules! check_matrix_eq {
    ($s:expr, $x:expr, $y:expr, $rows:expr, $cols:expr, $msg:expr $(,)?) => {
        $s.assert_matrix_equals(
            &$x[..],
            &$y[..],
            $rows,
            $cols,
            concat!(
                "check_matrix_eq(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($rows),
                ", ",
                stringify!($cols),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Assert the leading `rows x cols` block of two float matrices is within `tol`.
#[macro_export]
macro_rules! check_matrix_approx {
    ($s:expr, $x:expr, $y:expr, $rows:expr, $cols:expr, $tol:expr, $msg:expr $(,)?) => {
        $s.assert_matrix_approx(
            &$x[..],
            &$y[..],
            $rows,
            $cols,
            $tol,
            concat!(
                "check_matrix_approx(",
                stringify!($x),
                ", ",
                stringify!($y),
                ", ",
                stringify!($rows),
                ", ",
                stringify!($cols),
                ", ",
                stringify!($tol),
                ", ",
                stringify!($msg),
                ")"
            ),
        )?
    };
}

/// Fail the current test unconditionally.
#[macro_export]
macro_rules! fail {
    ($s:expr, $msg:expr $(,)?) => {
        return $s.fail($msg)
    };
}
