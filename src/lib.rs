//! Matrix-free Krylov decompositions with full reorthogonalization.
//!
//! This crate computes low-rank spectral approximations of large matrices that are only
//! accessible through matrix-vector products. Two decompositions are provided:
//!
//! - **Lanczos tridiagonalization** ([`solvers::tridiagonalize`]): for a symmetric operator
//!   `A` and a starting vector `v0`, an orthonormal basis `Q` of shape `(depth + 1, n)` and a
//!   symmetric tridiagonal `T` with `Q A Qᵗ ≈ T`.
//! - **Golub-Kahan-Lanczos bidiagonalization** ([`solvers::bidiagonalize`]): for a general
//!   `nrows × ncols` operator, orthonormal bases `U`, `V` and an upper bidiagonal `B` with
//!   `Uᵗ A Vᵗ ≈ B` (U stored by columns, V by rows).
//!
//! Both reorthogonalize every new basis vector against the whole pre-allocated basis. This
//! costs O(depth² × n) per decomposition but keeps the basis orthonormal where the plain
//! three-term recurrence loses orthogonality. Every step has the same shape, so the number
//! of iterations is fixed and explicit: there are no convergence tolerances or restarts.
//!
//! Built on [`faer`], the algorithms operate on any [`matrix::LinearOperator`]: dense
//! matrices, sparse matrices via [`matrix::MatrixFree`], or closures via
//! [`matrix::FnOperator`] and [`matrix::FnBiOperator`].
//!
//! ## Example Usage
//!
//! ```rust
//! use faer::{Col, Mat};
//! use krylov_decomp::{eigh_partial, tridiagonalize};
//!
//! // A symmetric matrix with eigenvalues 1, 2, ..., 6.
//! let a = Mat::from_fn(6, 6, |i, j| if i == j { (i + 1) as f64 } else { 0.0 });
//! let v0 = Col::from_fn(6, |i| 1.0 + 0.1 * i as f64);
//!
//! let out = tridiagonalize(&a, v0.as_ref(), 5).unwrap();
//! assert_eq!(out.basis.nrows(), 6);
//! assert_eq!(out.tridiagonal.diag.len(), 6);
//! assert_eq!(out.tridiagonal.offdiag.len(), 5);
//!
//! // At full depth the Ritz values are the eigenvalues.
//! let eig = eigh_partial(&a, v0.as_ref(), 5).unwrap();
//! assert!((eig.eigenvalues[5] - 6.0).abs() < 1e-8);
//! ```
//!
//! For step-by-step control, build a descriptor from [`algorithms`] and drive it with
//! [`algorithms::decompose_fixed`].

pub mod algorithms;
pub mod error;
pub mod matrix;
pub mod solvers;
pub mod utils;

// Re-export the main API for convenient access.
pub use error::DecompError;
pub use solvers::{bidiagonalize, eigh_partial, svd_partial, tridiagonalize};
