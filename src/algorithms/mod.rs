//! Krylov decomposition algorithms with full reorthogonalization.
//!
//! ** NOTE: We recommend using the high-level functions in [`crate::solvers`] instead. This
//! module is intended for use cases where the decomposition has to be driven step by step.
//!
//! Each algorithm is described as data: a type implementing [`DecompositionAlgorithm`]
//! that knows how to create a pre-allocated state from an initial vector, advance it by one
//! iteration, and turn the final state into a factorization. A single generic driver,
//! [`decompose_fixed`], runs any of them for a fixed number of iterations.
//!
//! - [`lanczos::LanczosTridiagonal`]: symmetric operators, orthonormal basis plus a
//!   symmetric tridiagonal matrix.
//! - [`golub_kahan::GolubKahanBidiagonal`]: general operators, two orthonormal bases plus
//!   an upper bidiagonal matrix.
//!
//! Every step has the same shape and cost regardless of the iteration index: the bases are
//! allocated with `depth + 1` zero rows up front and each new vector is reorthogonalized
//! against all of them.

pub mod golub_kahan;
pub mod lanczos;
pub mod orthogonalize;

use crate::error::DecompError;
use faer::{Col, ColRef, Mat};

/// An iterative matrix decomposition expressed as `init`, `step` and `extract` callbacks
/// over an explicit state, plus the iteration range it is valid for.
///
/// `Op` is the operator the algorithm needs: a [`crate::matrix::LinearOperator`] for
/// Lanczos, a [`crate::matrix::TransposeOperator`] for Golub-Kahan-Lanczos.
pub trait DecompositionAlgorithm<Op: ?Sized> {
    /// The pre-allocated state threaded through the iterations.
    type State;
    /// The factorization produced by [`DecompositionAlgorithm::extract`].
    type Output;

    /// Creates the initial state from the starting vector.
    fn init(&self, init_vec: ColRef<'_, f64>) -> Result<Self::State, DecompError>;

    /// Advances the decomposition by one iteration.
    ///
    /// The previous state is consumed and its successor returned. Steps are strictly
    /// sequential since each one reads the basis accumulated by all earlier steps.
    fn step(&self, state: Self::State, operator: &Op) -> Result<Self::State, DecompError>;

    /// Converts a final state into the factorization.
    fn extract(&self, state: Self::State) -> Self::Output;

    /// The range `[lower, upper)` of the fixed-count loop that completes the decomposition.
    fn lower_upper(&self) -> (usize, usize);
}

/// Runs `alg` on `operator` starting from `init_vec`: one call to `init`, exactly
/// `upper - lower` calls to `step`, one call to `extract`.
///
/// `(lower, upper)` should equal `alg.lower_upper()`. The driver does not check this; a
/// shorter range yields a partially filled factorization and a longer one fails with a
/// capacity error once the pre-allocated basis is exhausted.
pub fn decompose_fixed<A, Op>(
    lower: usize,
    upper: usize,
    init_vec: ColRef<'_, f64>,
    operator: &Op,
    alg: &A,
) -> Result<A::Output, DecompError>
where
    A: DecompositionAlgorithm<Op>,
    Op: ?Sized,
{
    log::debug!(
        "Decomposing from a vector of dimension {} over iterations {lower}..{upper}",
        init_vec.nrows()
    );
    let mut state = alg.init(init_vec)?;
    for k in lower..upper {
        log::trace!("Decomposition step {k}");
        state = alg.step(state, operator)?;
    }
    log::debug!("Decomposition finished after {} steps", upper.saturating_sub(lower));
    Ok(alg.extract(state))
}

/// A real symmetric tridiagonal matrix stored by its diagonal and off-diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricTridiagonal {
    /// The `depth + 1` diagonal entries.
    pub diag: Vec<f64>,
    /// The `depth` entries of the sub- and super-diagonal.
    pub offdiag: Vec<f64>,
}

impl SymmetricTridiagonal {
    /// Assembles the dense `(depth + 1) × (depth + 1)` matrix.
    pub fn to_dense(&self) -> Mat<f64> {
        let n = self.diag.len();
        let mut t = Mat::zeros(n, n);
        for (i, &d) in self.diag.iter().enumerate() {
            t[(i, i)] = d;
        }
        for (i, &e) in self.offdiag.iter().enumerate() {
            t[(i, i + 1)] = e;
            t[(i + 1, i)] = e;
        }
        t
    }
}

/// A real upper bidiagonal matrix stored by its diagonal and super-diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct UpperBidiagonal {
    /// The `depth + 1` diagonal entries (the `alpha` coefficients).
    pub diag: Vec<f64>,
    /// The `depth` super-diagonal entries (the `beta` coefficients).
    pub superdiag: Vec<f64>,
}

impl UpperBidiagonal {
    /// Assembles the dense `(depth + 1) × (depth + 1)` matrix.
    pub fn to_dense(&self) -> Mat<f64> {
        let n = self.diag.len();
        let mut b = Mat::zeros(n, n);
        for (i, &a) in self.diag.iter().enumerate() {
            b[(i, i)] = a;
        }
        for (i, &e) in self.superdiag.iter().enumerate() {
            b[(i, i + 1)] = e;
        }
        b
    }
}

/// Result of Lanczos tridiagonalization: `basis @ A @ basisᵗ ≈ tridiagonal`.
#[derive(Debug, Clone)]
pub struct TridiagonalOutput {
    /// Orthonormal basis of shape `(depth + 1, n)`, one basis vector per row.
    pub basis: Mat<f64>,
    /// The projected operator.
    pub tridiagonal: SymmetricTridiagonal,
}

/// The direction following the last stored right basis vector, and its coupling coefficient.
#[derive(Debug, Clone)]
pub struct Residual {
    /// Coupling coefficient `beta` of the next direction.
    pub beta: f64,
    /// The next (unstored) unit right direction.
    pub vector: Col<f64>,
}

/// Result of Golub-Kahan-Lanczos bidiagonalization.
///
/// With `U = left_basis` (columns), `V = right_basis` (rows) and `B` the dense bidiagonal
/// matrix: `A @ Vᵗ ≈ U @ B` and `Aᵗ @ U ≈ Vᵗ @ Bᵗ + beta * v ⊗ e_last`.
#[derive(Debug, Clone)]
pub struct BidiagonalOutput {
    /// Left orthonormal basis of shape `(nrows, depth + 1)`, one basis vector per column.
    pub left_basis: Mat<f64>,
    /// The projected operator.
    pub bidiagonal: UpperBidiagonal,
    /// Right orthonormal basis of shape `(depth + 1, ncols)`, one basis vector per row.
    pub right_basis: Mat<f64>,
    /// The trailing `(beta, v)` pair needed to extend the decomposition.
    pub residual: Residual,
}

/// Index of the previous row in a circular buffer of `len` rows.
///
/// At `i == 0` this wraps to the last row, which is still zero padding while the first
/// row is being written.
#[inline]
pub(crate) fn previous_index(i: usize, len: usize) -> usize {
    (i + len - 1) % len
}
