//! Central Finite Differences
//!
//! Approximates derivatives of arbitrary scalar-valued functions by
//! sampling them a step $`h`$ on either side of a point,
//! ```math
//! f'(x) \approx \frac{f(x + h) - f(x - h)}{2h}
//! ```
//! which has $`O(h^2)`$ truncation error, at the cost of two evaluations of
//! $`f`$ per coordinate. Round-off grows like $`\epsilon_{\text{mach}} / h`$, so
//! for `f64` a step between `1e-6` and `1e-3` is a sensible range.
//!
//! Two gradient routines are provided:
//! - [`gradient`]: perturbs a private copy of a vector along each standard
//!   basis vector. Default step [`DEFAULT_STEP`].
//! - [`gradient_in_place`]: perturbs the caller's array of any dimension
//!   one element at a time and restores it. Default step [`DEFAULT_IN_PLACE_STEP`].
//!
//! Every routine has a `try_` variant for objectives returning a `Result`.

use crate::error::{Error, Result};
use approx::AbsDiffEq;
use ndarray::prelude::*;
use ndarray::{Data, DataMut, IntoDimension, NdFloat}; // NdFloat includes LinalgScalar and ScalarOperand
use num_traits::AsPrimitive;
use std::convert::Infallible;

/// Default step for [`derivative`], [`gradient`] and gradient descent.
pub const DEFAULT_STEP: f64 = 1e-5;

/// Default step for [`gradient_in_place`].
///
/// Larger than [`DEFAULT_STEP`]: less round-off when the objective reduces
/// over many elements, at the price of more truncation error.
pub const DEFAULT_IN_PLACE_STEP: f64 = 1e-4;

pub(crate) fn check_step<S: NdFloat, E>(h: S) -> Result<(), E> {
    if h > S::zero() && h.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidStep {
            step: h.to_f64().unwrap_or(f64::NAN),
        })
    }
}

/// Numerical derivative of a scalar function
///
/// Returns $`(f(x+h) - f(x-h)) / 2h`$.
///
/// Parameters
/// ----------
/// - __f:__  function of one variable, evaluated exactly twice
/// - __x:__  point of evaluation
/// - __h:__  step, must be positive and finite
pub fn derivative<S: NdFloat>(mut f: impl FnMut(S) -> S, x: S, h: S) -> Result<S> {
    try_derivative(|x| Ok::<S, Infallible>(f(x)), x, h)
}

/// Fallible version of [`derivative`]
///
/// The first error returned by `f` is passed through as [`Error::Objective`].
pub fn try_derivative<S, E>(
    mut f: impl FnMut(S) -> std::result::Result<S, E>,
    x: S,
    h: S,
) -> Result<S, E>
where
    S: NdFloat,
{
    check_step(h)?;
    let f_plus = f(x + h).map_err(Error::Objective)?;
    let f_minus = f(x - h).map_err(Error::Objective)?;
    Ok((f_plus - f_minus) / (h + h))
}

/// Numerical gradient of a function of a vector
///
/// For each coordinate $`i`$,
/// ```math
/// g_i = \frac{f(x + h e_i) - f(x - h e_i)}{2h}
/// ```
/// where $`e_i`$ is the $`i`$-th standard basis vector, i.e. the rows of
/// $`hI`$ are used as perturbations.
///
/// The point may have any element type that converts to the float type of
/// `f` (integers included), and is converted before perturbing so that the
/// step is never truncated. `x` itself is not modified; `f` sees a private
/// copy. This takes exactly `2 * x.len()` evaluations of `f` and none when
/// `x` is empty.
///
/// Parameters
/// ----------
/// - __f:__  objective, scalar-valued function of a vector
/// - __x:__  point of evaluation
/// - __h:__  step, must be positive and finite. [`DEFAULT_STEP`] is typical.
pub fn gradient<S, A, T>(
    mut f: impl FnMut(ArrayView1<S>) -> S,
    x: &ArrayBase<T, Ix1>,
    h: S,
) -> Result<Array1<S>>
where
    S: NdFloat,
    A: AsPrimitive<S>,
    T: Data<Elem = A>,
{
    try_gradient(|v| Ok::<S, Infallible>(f(v)), x, h)
}

/// Fallible version of [`gradient`]
///
/// Stops at the first error of `f`, returning it as [`Error::Objective`].
pub fn try_gradient<S, A, T, E>(
    f: impl FnMut(ArrayView1<S>) -> std::result::Result<S, E>,
    x: &ArrayBase<T, Ix1>,
    h: S,
) -> Result<Array1<S>, E>
where
    S: NdFloat,
    A: AsPrimitive<S>,
    T: Data<Elem = A>,
{
    check_step(h)?;
    let x: Array1<S> = x.mapv(|a| a.as_());
    central_gradient(f, x.view(), h)
}

/// Gradient of `f` at an already converted point, `h` already checked.
pub(crate) fn central_gradient<S, E>(
    mut f: impl FnMut(ArrayView1<S>) -> std::result::Result<S, E>,
    x: ArrayView1<S>,
    h: S,
) -> Result<Array1<S>, E>
where
    S: NdFloat,
{
    let two_h = h + h;

    let mut probe = x.to_owned();
    let mut grad = Array1::<S>::zeros(x.len());
    for (i, &xi) in x.iter().enumerate() {
        probe[i] = xi + h;
        let f_plus = f(probe.view()).map_err(Error::Objective)?;
        probe[i] = xi - h;
        let f_minus = f(probe.view()).map_err(Error::Objective)?;
        probe[i] = xi;
        grad[i] = (f_plus - f_minus) / two_h;
    }
    log::trace!("gradient: {} evaluations", 2 * x.len());
    Ok(grad)
}

/// Temporary write to one element of an array.
///
/// The original value is put back when this is dropped, including when the
/// objective returns early with an error or panics.
struct Perturbation<'a, S, T, D>
where
    S: Copy,
    T: DataMut<Elem = S>,
    D: Dimension,
{
    array: &'a mut ArrayBase<T, D>,
    index: D,
    original: S,
}

impl<'a, S, T, D> Perturbation<'a, S, T, D>
where
    S: Copy,
    T: DataMut<Elem = S>,
    D: Dimension,
{
    fn new(array: &'a mut ArrayBase<T, D>, index: D) -> Self {
        let original = array[index.clone()];
        Perturbation {
            array,
            index,
            original,
        }
    }

    fn set(&mut self, value: S) {
        self.array[self.index.clone()] = value;
    }

    fn view(&self) -> ArrayView<'_, S, D> {
        self.array.view()
    }
}

impl<'a, S, T, D> Drop for Perturbation<'a, S, T, D>
where
    S: Copy,
    T: DataMut<Elem = S>,
    D: Dimension,
{
    fn drop(&mut self) {
        self.array[self.index.clone()] = self.original;
    }
}

/// Numerical gradient over an array of any shape, perturbing it in place
///
/// Visits every element in logical (row-major) order, sets it to
/// $`x_i + h`$ and then $`x_i - h`$, evaluating `f` on the *whole* array
/// each time, and writes the original value back before moving on.
/// The result has the same shape as `x`.
///
/// `f` must be free of side effects across calls (no counters, no
/// randomness) for the result to be meaningful. Whatever `f` does, `x` is
/// bit-for-bit unchanged when this returns, whether it succeeds, fails, or
/// `f` panics.
///
/// Takes `2 * x.len()` evaluations of `f`.
pub fn gradient_in_place<S, T, D>(
    mut f: impl FnMut(ArrayView<S, D>) -> S,
    x: &mut ArrayBase<T, D>,
    h: S,
) -> Result<Array<S, D>>
where
    S: NdFloat,
    T: DataMut<Elem = S>,
    D: Dimension,
{
    try_gradient_in_place(|v| Ok::<S, Infallible>(f(v)), x, h)
}

/// Fallible version of [`gradient_in_place`]
pub fn try_gradient_in_place<S, T, D, E>(
    mut f: impl FnMut(ArrayView<S, D>) -> std::result::Result<S, E>,
    x: &mut ArrayBase<T, D>,
    h: S,
) -> Result<Array<S, D>, E>
where
    S: NdFloat,
    T: DataMut<Elem = S>,
    D: Dimension,
{
    check_step(h)?;
    let two_h = h + h;

    let mut grad = Array::<S, D>::zeros(x.raw_dim());
    for pattern in ndarray::indices(x.raw_dim()) {
        let index = pattern.into_dimension();
        let (f_plus, f_minus) = {
            let mut probe = Perturbation::new(&mut *x, index.clone());
            let xi = probe.original;
            probe.set(xi + h);
            let f_plus = f(probe.view()).map_err(Error::Objective)?;
            probe.set(xi - h);
            let f_minus = f(probe.view()).map_err(Error::Objective)?;
            (f_plus, f_minus)
        };
        grad[index] = (f_plus - f_minus) / two_h;
    }
    log::trace!("gradient_in_place: {} evaluations", 2 * grad.len());
    Ok(grad)
}

/// Largest absolute elementwise difference, or `None` if the shapes differ.
///
/// A NaN difference anywhere makes the result NaN.
pub fn max_abs_diff<S, T, U, D>(a: &ArrayBase<T, D>, b: &ArrayBase<U, D>) -> Option<S>
where
    S: NdFloat,
    T: Data<Elem = S>,
    U: Data<Elem = S>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return None;
    }
    let max = a.iter().zip(b.iter()).fold(S::zero(), |acc, (&x, &y)| {
        let d = (x - y).abs();
        if d > acc || d.is_nan() {
            d
        } else {
            acc
        }
    });
    Some(max)
}

/// Outcome of [`check_gradient`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientCheck<S> {
    /// Largest absolute difference between analytic and numerical gradient.
    /// Infinite if the lengths differ.
    pub max_error: S,
    /// Whether every component agreed to within the requested tolerance.
    pub passed: bool,
}

/// Gradient checking
///
/// Compares an analytically computed gradient of `f` at `x` against
/// [`gradient`] with step `h`. Useful for testing hand-written or
/// back-propagated gradients.
pub fn check_gradient<S, T, U>(
    mut f: impl FnMut(ArrayView1<S>) -> S,
    analytic: &ArrayBase<T, Ix1>,
    x: &ArrayBase<U, Ix1>,
    h: S,
    epsilon: S,
) -> Result<GradientCheck<S>>
where
    S: NdFloat + AbsDiffEq<Epsilon = S>,
    T: Data<Elem = S>,
    U: Data<Elem = S>,
{
    check_step(h)?;
    let numerical = central_gradient(|v| Ok::<S, Infallible>(f(v)), x.view(), h)?;
    let max_error = max_abs_diff(analytic, &numerical).unwrap_or_else(S::infinity);
    let passed = analytic.abs_diff_eq(&numerical, epsilon);
    if !passed {
        log::debug!("gradient check failed, max error {:e}", max_error);
    }
    Ok(GradientCheck { max_error, passed })
}


#[cfg(all(rustc_nightly, test))]
mod benches {
    use super::*;
    use test::Bencher;

    #[bench]
    fn gradient_64(b: &mut Bencher) {
        let x = Array1::linspace(-1., 1., 64);
        b.iter(|| gradient(|v: ArrayView1<f64>| v.dot(&v), &x, DEFAULT_STEP));
    }

    #[bench]
    fn gradient_in_place_8x8(b: &mut Bencher) {
        let mut x = Array2::from_shape_fn((8, 8), |(i, j)| i as f64 - j as f64);
        b.iter(|| gradient_in_place(|v: ArrayView2<f64>| v.sum(), &mut x, DEFAULT_IN_PLACE_STEP));
    }
}
