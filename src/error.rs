//! This module defines the custom error types for the library.
//!
//! All failure conditions of the decomposition descriptors, the fixed-count driver and
//! the dense consumers are collected into a single enum wrapped by [`DecompError`].
//!
//! Using the [`thiserror`] crate keeps the error types idiomatic with minimal
//! boilerplate. Note that [`faer::linalg::svd::SvdError`] and
//! [`faer::linalg::evd::EvdError`] do not implement the standard [`std::error::Error`]
//! trait, so we wrap them manually.
//!
//! Numerical degeneracy (normalizing an exactly-zero vector) is deliberately absent from
//! this taxonomy: it produces non-finite values rather than an error.
use thiserror::Error;

/// Represents all possible errors that can occur while decomposing an operator.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct DecompError(#[from] DecompErrorKind);

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum DecompErrorKind {
    /// The requested depth lies outside the valid range for the chosen algorithm.
    /// Raised at construction (or initialization) time, before any stepping.
    #[error("{message}")]
    InvalidDepth { depth: usize, message: String },

    /// The driver requested more steps than the pre-allocated basis can hold.
    #[error(
        "Step {step} exceeds the pre-allocated capacity of {capacity} basis vectors. Drive the decomposition over its declared range."
    )]
    CapacityExceeded { step: usize, capacity: usize },

    /// The operator and the vector it is applied to have incompatible dimensions.
    #[error(
        "Dimension mismatch: operator has {operator_cols} columns but vector has {vector_rows} rows."
    )]
    DimensionMismatch {
        operator_cols: usize,
        vector_rows: usize,
    },

    /// The operator's output length disagrees with the basis vectors it is projected onto.
    #[error(
        "Dimension mismatch: operator has {operator_rows} rows but basis vectors have {basis_len} entries."
    )]
    OutputDimensionMismatch {
        operator_rows: usize,
        basis_len: usize,
    },

    /// Wraps an error originating from [`faer`]'s singular value decomposition module.
    #[error("A numerical error occurred during the SVD of the bidiagonal matrix: {0:?}")]
    SvdError(faer::linalg::svd::SvdError),

    /// Wraps an error originating from [`faer`]'s eigendecomposition module.
    #[error("A numerical error occurred during the eigendecomposition of the tridiagonal matrix: {0:?}")]
    EvdError(faer::linalg::evd::EvdError),
}

impl DecompError {
    /// Returns `true` if this error was raised by a depth outside the valid range.
    pub fn is_invalid_depth(&self) -> bool {
        matches!(self.0, DecompErrorKind::InvalidDepth { .. })
    }

    /// Returns `true` if the driver stepped beyond the pre-allocated basis.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self.0, DecompErrorKind::CapacityExceeded { .. })
    }

    /// Returns `true` if an operator and a vector disagreed on dimensions.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self.0,
            DecompErrorKind::DimensionMismatch { .. }
                | DecompErrorKind::OutputDimensionMismatch { .. }
        )
    }
}

// Compare through the inner kind.
impl PartialEq for DecompError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
