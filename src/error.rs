//! Errors shared by the finite-difference routines and the optimizers

use std::convert::Infallible;
use thiserror::Error;

/// Result alias used throughout the crate.
///
/// `E` is the error type of the objective function. Infallible objectives
/// (plain closures returning a float) use the default, `Infallible`.
pub type Result<T, E = Infallible> = std::result::Result<T, Error<E>>;

/// Failure of a finite-difference or descent routine
#[derive(Debug, Error)]
pub enum Error<E = Infallible> {
    /// The finite-difference step `h` was zero, negative or not finite.
    ///
    /// Reported before the objective is evaluated.
    #[error("finite-difference step must be positive and finite, got {step}")]
    InvalidStep { step: f64 },

    /// The objective returned an error. No partial result is produced.
    #[error("objective evaluation failed")]
    Objective(#[source] E),

    /// An iterate became non-finite while `halt_on_divergence` was set.
    #[error("iterate became non-finite after iteration {iteration}")]
    Diverged { iteration: usize },
}

impl<E> Error<E> {
    /// Returns the objective's own error, if that is what failed.
    pub fn into_objective(self) -> Option<E> {
        match self {
            Error::Objective(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Domain(f64);

    impl fmt::Display for Domain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "outside domain at {}", self.0)
        }
    }

    impl std::error::Error for Domain {}

    #[test]
    fn objective_error_is_source() {
        let err: Error<Domain> = Error::Objective(Domain(-1.0));
        assert_eq!(err.to_string(), "objective evaluation failed");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("outside domain at -1".to_string())
        );
        assert_eq!(err.into_objective(), Some(Domain(-1.0)));
    }

    #[test]
    fn invalid_step_message() {
        let err: Error = Error::InvalidStep { step: 0.0 };
        assert_eq!(
            err.to_string(),
            "finite-difference step must be positive and finite, got 0"
        );
        assert!(err.source().is_none());
        assert!(err.into_objective().is_none());
    }
}
