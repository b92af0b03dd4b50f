//! Errors surfaced by the topic model routines.
//!
//! Only bad input is reported. Numerical trouble inside the EM loop
//! (rows that lose all of their mass) is recovered on the spot and
//! never shows up here.

use std::fmt;
use thiserror::Error;

/// Why a call was rejected before any iteration started
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlsaError {
    /// An observation refers to a document/word outside of the
    /// declared bounds, or carries a non-positive weight
    #[error("invalid observation #{index}: {reason}")]
    InvalidObservation {
        /// Position of the offending observation in the input
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// A setting or a supplied table cannot be used
    #[error("invalid configuration: {param} = {value} ({constraint})")]
    InvalidConfiguration {
        /// Name of the setting
        param: String,
        /// Value we were given
        value: String,
        /// What we needed instead
        constraint: String,
    },
}

impl PlsaError {
    pub(crate) fn observation(index: usize, reason: impl Into<String>) -> Self {
        PlsaError::InvalidObservation {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(
        param: impl Into<String>,
        value: impl fmt::Display,
        constraint: impl Into<String>,
    ) -> Self {
        PlsaError::InvalidConfiguration {
            param: param.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }
}

/// Result type of the library
pub type Result<T> = std::result::Result<T, PlsaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = PlsaError::observation(3, "word 12 >= 10");
        assert_eq!(err.to_string(), "invalid observation #3: word 12 >= 10");

        let err = PlsaError::configuration("tol", 0.0, "must be positive");
        assert!(err.to_string().contains("tol = 0"));
    }

    #[test]
    fn converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(PlsaError::configuration("max_iter", 0, ">= 1"))?;
            Ok(())
        }
        assert!(fails().is_err());
    }
}
