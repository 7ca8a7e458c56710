//! First Order Methods on Numerically Differentiated Objectives
//!
//! The objective $`f`$ is only ever evaluated, never differentiated
//! analytically: every gradient is a central finite difference from
//! [`crate::diff`]. Each iteration therefore costs $`2n`$ evaluations of
//! $`f`$ for an $`n`$-dimensional point, which limits these methods to
//! small problems.
//!
//! No line search or convergence test is performed. If the learning rate is
//! too large for the curvature of $`f`$ the iterates oscillate or grow without
//! bound; see [`GradientDescent::halt_on_divergence`].

mod gd;
pub use gd::*;

/// Points visited by an optimizer
///
/// `history` holds one independent snapshot per iteration, starting with the
/// initial point, so `history.len() == iterations + 1` and
/// `history.last() == Some(&x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<P> {
    /// final iterate
    pub x: P,
    /// every iterate, initial point first
    pub history: Vec<P>,
}

impl<P> Trajectory<P> {
    /// Number of updates performed.
    pub fn iterations(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    /// The starting point.
    pub fn initial(&self) -> &P {
        &self.history[0]
    }

    pub fn into_parts(self) -> (P, Vec<P>) {
        (self.x, self.history)
    }
}
