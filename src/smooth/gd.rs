use super::Trajectory;
use crate::diff::{central_gradient, check_step, try_derivative, DEFAULT_STEP};
use crate::error::{Error, Result};
use ndarray::prelude::*;
use ndarray::{Data, NdFloat}; // includes LinalgScalar and ScalarOperand
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Default learning rate $`\alpha`$.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Default number of iterations $`N`$.
pub const DEFAULT_NUM_ITERATIONS: usize = 100;

/// Gradient Descent with numerical gradients
///
/// Full-batch, fixed-step steepest descent. Runs exactly
/// `num_iterations` updates; there is no early stopping.
///
/// Algorithm
/// ---------
/// ```math
/// \begin{aligned}
/// g_i &= \left[ \frac{f(x_i + h e_j) - f(x_i - h e_j)}{2h} \right]_j \\
/// x_{i+1} &= x_i - \alpha g_i
/// \end{aligned}
/// ```
///
/// Parameters
/// ----------
/// - __learning_rate:__   $`\alpha`$, the fixed multiplier of the negative gradient
/// - __num_iterations:__  $`N`$, the exact number of updates
/// - __step:__            $`h`$, finite-difference step, must be positive and finite
/// - __halt_on_divergence:__ if set, stop with [`Error::Diverged`] as soon as an
///                        iterate is non-finite. Otherwise non-finite values
///                        propagate through the rest of the run and a warning
///                        is logged once.
///
/// Every field may be omitted when deserializing, e.g. from a TOML table,
/// and then takes its default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    bound(
        serialize = "S: serde::Serialize",
        deserialize = "S: serde::Deserialize<'de>, GradientDescent<S>: Default"
    )
)]
pub struct GradientDescent<S> {
    pub learning_rate: S,
    pub num_iterations: usize,
    pub step: S,
    pub halt_on_divergence: bool,
}

macro_rules! impl_default {
    ($($t:ty),*) => {
        $(
            impl Default for GradientDescent<$t> {
                fn default() -> Self {
                    GradientDescent {
                        learning_rate: DEFAULT_LEARNING_RATE as $t,
                        num_iterations: DEFAULT_NUM_ITERATIONS,
                        step: DEFAULT_STEP as $t,
                        halt_on_divergence: false,
                    }
                }
            }
        )*
    };
}

impl_default!(f32, f64);

impl<S: NdFloat> GradientDescent<S> {
    pub fn new(learning_rate: S, num_iterations: usize, step: S) -> Self {
        GradientDescent {
            learning_rate,
            num_iterations,
            step,
            halt_on_divergence: false,
        }
    }

    #[must_use]
    pub fn with_step(mut self, step: S) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_halt_on_divergence(mut self, halt: bool) -> Self {
        self.halt_on_divergence = halt;
        self
    }

    /// Minimize `f` starting from `x0`
    ///
    /// `x0` may have any element type convertible to `S`; it is copied and
    /// never modified.
    pub fn minimize<A, T>(
        &self,
        mut f: impl FnMut(ArrayView1<S>) -> S,
        x0: &ArrayBase<T, Ix1>,
    ) -> Result<Trajectory<Array1<S>>>
    where
        A: AsPrimitive<S>,
        T: Data<Elem = A>,
    {
        self.try_minimize(|x| Ok::<S, Infallible>(f(x)), x0)
    }

    /// Fallible version of [`minimize`](GradientDescent::minimize)
    ///
    /// The first error from `f` aborts the run; the partial trajectory is
    /// discarded.
    pub fn try_minimize<A, T, E>(
        &self,
        mut f: impl FnMut(ArrayView1<S>) -> std::result::Result<S, E>,
        x0: &ArrayBase<T, Ix1>,
    ) -> Result<Trajectory<Array1<S>>, E>
    where
        A: AsPrimitive<S>,
        T: Data<Elem = A>,
    {
        check_step(self.step)?;
        let mut x: Array1<S> = x0.mapv(|a| a.as_());
        log::debug!(
            "gradient descent: n = {}, {} iterations, learning rate {}, step {:e}",
            x.len(),
            self.num_iterations,
            self.learning_rate,
            self.step
        );

        let mut history = Vec::with_capacity(self.num_iterations + 1);
        history.push(x.clone());
        let mut warned = false;
        for iter in 1..=self.num_iterations {
            let grad = central_gradient(&mut f, x.view(), self.step)?;
            x.scaled_add(-self.learning_rate, &grad);
            if log::log_enabled!(log::Level::Trace) {
                let grad_max = grad.fold(S::zero(), |acc, g| acc.max(g.abs()));
                log::trace!("iter {}: max |grad| = {:e}", iter, grad_max);
            }
            self.check_finite(x.iter().all(|v| v.is_finite()), iter, &mut warned)?;
            history.push(x.clone());
        }

        log::debug!("gradient descent finished after {} iterations", self.num_iterations);
        Ok(Trajectory { x, history })
    }

    /// Minimize a function of one variable starting from `x0`
    ///
    /// Same update and history rules as [`minimize`](GradientDescent::minimize),
    /// with the gradient replaced by [`derivative`](crate::diff::derivative).
    pub fn minimize_scalar(&self, mut f: impl FnMut(S) -> S, x0: S) -> Result<Trajectory<S>> {
        self.try_minimize_scalar(|x| Ok::<S, Infallible>(f(x)), x0)
    }

    /// Fallible version of [`minimize_scalar`](GradientDescent::minimize_scalar)
    pub fn try_minimize_scalar<E>(
        &self,
        mut f: impl FnMut(S) -> std::result::Result<S, E>,
        x0: S,
    ) -> Result<Trajectory<S>, E> {
        check_step(self.step)?;
        log::debug!(
            "scalar gradient descent: {} iterations, learning rate {}, step {:e}",
            self.num_iterations,
            self.learning_rate,
            self.step
        );

        let mut x = x0;
        let mut history = Vec::with_capacity(self.num_iterations + 1);
        history.push(x);
        let mut warned = false;
        for iter in 1..=self.num_iterations {
            let grad = try_derivative(&mut f, x, self.step)?;
            x = x - self.learning_rate * grad;
            log::trace!("iter {}: x = {}, grad = {:e}", iter, x, grad);
            self.check_finite(x.is_finite(), iter, &mut warned)?;
            history.push(x);
        }
        Ok(Trajectory { x, history })
    }

    fn check_finite<E>(&self, finite: bool, iteration: usize, warned: &mut bool) -> Result<(), E> {
        if finite || *warned {
            return Ok(());
        }
        if self.halt_on_divergence {
            return Err(Error::Diverged { iteration });
        }
        log::warn!(
            "gradient descent produced a non-finite iterate at iteration {}, continuing",
            iteration
        );
        *warned = true;
        Ok(())
    }
}

/// Gradient Descent with numerical gradients
///
/// Shorthand for [`GradientDescent::new`] followed by
/// [`GradientDescent::minimize`].
///
/// Parameters
/// ----------
/// - __f:__               objective, scalar-valued function of a vector
/// - __x0:__              initial point
/// - __learning_rate:__   fixed step along the negative gradient
/// - __num_iterations:__  exact number of updates
/// - __h:__               finite-difference step
pub fn gradient_descent<S, A, T>(
    f: impl FnMut(ArrayView1<S>) -> S,
    x0: &ArrayBase<T, Ix1>,
    learning_rate: S,
    num_iterations: usize,
    h: S,
) -> Result<Trajectory<Array1<S>>>
where
    S: NdFloat,
    A: AsPrimitive<S>,
    T: Data<Elem = A>,
{
    GradientDescent::new(learning_rate, num_iterations, h).minimize(f, x0)
}


#[cfg(all(rustc_nightly, test))]
mod benches {
    use super::*;
    use test::Bencher;

    #[bench]
    fn rosenbrock_100_iters(b: &mut Bencher) {
        let f = |x: ArrayView1<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2);
        let gd = GradientDescent::new(1e-3, 100, DEFAULT_STEP);
        b.iter(|| gd.minimize(f, &array![-1.2, 1.0]));
    }
}
