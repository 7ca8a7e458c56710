//! The `ndarray-numdiff` crate approximates derivatives and gradients of
//! arbitrary scalar-valued functions of `ndarray`s by central finite
//! differences, and minimizes such functions by gradient descent.
//!
//! It includes:
//! - numerical derivatives of functions of one variable
//! - numerical gradients of functions of a vector, on a private copy
//! - numerical gradients over arrays of any shape, perturbed in place and restored
//! - fixed-step gradient descent recording the full trajectory
//! - gradient checking helpers for hand-written gradients
//!
//! The objective is any closure returning a float. Fallible objectives
//! returning a `Result` are supported through the `try_` variants, and their
//! errors are passed through unchanged as [`Error::Objective`].
//!
//! Every gradient costs two evaluations of the objective per coordinate, so
//! these tools suit small problems, testing, and checking analytic gradients
//! rather than training large models.
//!
//! ```
//! use ndarray::prelude::*;
//! use ndarray_numdiff::diff::{gradient, DEFAULT_STEP};
//! use ndarray_numdiff::smooth::GradientDescent;
//!
//! let f = |x: ArrayView1<f64>| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2);
//!
//! let g = gradient(f, &array![0.0, 0.0], DEFAULT_STEP).unwrap();
//! assert!((g[0] + 4.0).abs() < 1e-6 && (g[1] - 2.0).abs() < 1e-6);
//!
//! let res = GradientDescent::<f64>::default().minimize(f, &array![0.0, 0.0]).unwrap();
//! assert_eq!(res.history.len(), 101);
//! assert!((res.x[0] - 2.0).abs() < 1e-3 && (res.x[1] + 1.0).abs() < 1e-3);
//! ```

#![cfg_attr(all(rustc_nightly, test), feature(test))]
#[cfg(all(rustc_nightly, test))]
extern crate test;

pub mod diff;
mod error;
pub mod smooth;

pub use error::{Error, Result};
