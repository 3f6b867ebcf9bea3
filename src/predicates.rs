//! Equality predicates.
//!
//! Each predicate validates its own preconditions first. A violated
//! precondition marks the [`Status`] invalid and skips the comparison;
//! otherwise the comparison result is recorded as pass or fail.
//!
//! Scalar tolerance comparison is strict (`|x - y| < tol`), while array and
//! matrix tolerance comparisons are not (an element fails only when
//! `|x - y| > tol`). A difference exactly equal to `tol` therefore fails for
//! scalars and passes for arrays and matrices.

use std::fmt;
use std::ops::Sub;

use crate::status::Status;

/// Floating point types usable with tolerance comparisons.
pub trait Approx: Copy + PartialOrd + Sub<Output = Self> + fmt::Debug + fmt::LowerExp {
    /// Additive identity.
    const ZERO: Self;

    /// Absolute value.
    fn abs(self) -> Self;
}

macro_rules! impl_approx {
    ($($t:ty),*) => {
        $(
            impl Approx for $t {
                const ZERO: Self = 0.0;

                fn abs(self) -> Self {
                    <$t>::abs(self)
                }
            }
        )*
    };
}

impl_approx!(f32, f64);

/// Tolerance must be strictly positive. NaN is rejected as well.
fn check_tolerance<T: Approx>(tol: T) -> Result<(), String> {
    if tol > T::ZERO {
        Ok(())
    } else {
        Err(format!(
            "Invalid \"tol\" value ({:e}). \"tol\" must be positive",
            tol
        ))
    }
}

fn check_length<T>(x: &[T], y: &[T], len: usize) -> Result<(), String> {
    if len < 1 {
        return Err(format!("Invalid array length ({}). Length must be > 0.", len));
    }
    if x.len() < len || y.len() < len {
        return Err(format!(
            "Invalid array length ({}). Operands hold {} and {} elements.",
            len,
            x.len(),
            y.len()
        ));
    }
    Ok(())
}

fn check_shape<T, R: AsRef<[T]>>(x: &[R], y: &[R], rows: usize, cols: usize) -> Result<(), String> {
    if rows < 1 || cols < 1 {
        return Err(format!(
            "Invalid matrix size ({}x{}). Dimension must be > 0.",
            rows, cols
        ));
    }
    let fits = |m: &[R]| m.len() >= rows && m[..rows].iter().all(|row| row.as_ref().len() >= cols);
    if !fits(x) || !fits(y) {
        return Err(format!(
            "Invalid matrix size ({}x{}). Operands are smaller than the requested size.",
            rows, cols
        ));
    }
    Ok(())
}

/// Scalar tolerance equality: passes iff `|x - y| < tol`.
pub fn approx_eq<T: Approx>(x: T, y: T, tol: T, status: &mut Status) {
    if let Err(message) = check_tolerance(tol) {
        status.reject(message);
        return;
    }
    status.record(!(abs_diff(x, y) < tol));
}

/// Exact equality of the first `len` elements.
pub fn array_eq<T: PartialEq>(x: &[T], y: &[T], len: usize, status: &mut Status) {
    if let Err(message) = check_length(x, y, len) {
        status.reject(message);
        return;
    }
    status.record(x[..len] != y[..len]);
}

/// Tolerance equality of the first `len` elements: an element fails iff
/// `|x[i] - y[i]| > tol`.
pub fn array_approx<T: Approx>(x: &[T], y: &[T], len: usize, tol: T, status: &mut Status) {
    if let Err(message) = check_tolerance(tol).and_then(|_| check_length(x, y, len)) {
        status.reject(message);
        return;
    }
    let failed = x[..len]
        .iter()
        .zip(&y[..len])
        .any(|(a, b)| abs_diff(*a, *b) > tol);
    status.record(failed);
}

/// Exact equality of the leading `rows x cols` block.
pub fn matrix_eq<T, R>(x: &[R], y: &[R], rows: usize, cols: usize, status: &mut Status)
where
    T: PartialEq,
    R: AsRef<[T]>,
{
    if let Err(message) = check_shape(x, y, rows, cols) {
        status.reject(message);
        return;
    }
    let failed = x[..rows]
        .iter()
        .zip(&y[..rows])
        .any(|(a, b)| a.as_ref()[..cols] != b.as_ref()[..cols]);
    status.record(failed);
}

/// Tolerance equality of the leading `rows x cols` block, element-wise
/// non-strict like [`array_approx`].
pub fn matrix_approx<T, R>(x: &[R], y: &[R], rows: usize, cols: usize, tol: T, status: &mut Status)
where
    T: Approx,
    R: AsRef<[T]>,
{
    if let Err(message) = check_tolerance(tol).and_then(|_| check_shape(x, y, rows, cols)) {
        status.reject(message);
        return;
    }
    let failed = x[..rows].iter().zip(&y[..rows]).any(|(a, b)| {
        a.as_ref()[..cols]
            .iter()
            .zip(&b.as_ref()[..cols])
            .any(|(p, q)| abs_diff(*p, *q) > tol)
    });
    status.record(failed);
}

fn abs_diff<T: Approx>(x: T, y: T) -> T {
    (x - y).abs()
}
