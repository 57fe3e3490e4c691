//! Lanczos tridiagonalization with pre-allocation and full reorthogonalization.
//!
//! Decomposes a symmetric operator `A` into `Q A Qᵗ ≈ T`, where the rows of `Q` are an
//! orthonormal basis of the Krylov subspace `K_{depth+1}(A, v0)` and `T` is symmetric
//! tridiagonal. Use it for approximate eigenvalue decompositions.
//!
//! The basis holds `depth + 1` rows from the start. Each new vector is reorthogonalized
//! against all of them, including the rows that are still zero; those contribute nothing,
//! so the result equals reorthogonalizing against the valid prefix while every step keeps
//! the same shape and cost.

use super::{
    DecompositionAlgorithm, SymmetricTridiagonal, TridiagonalOutput,
    orthogonalize::{normalize, project_out, project_out_rows},
    previous_index,
};
use crate::{
    error::{DecompError, DecompErrorKind},
    matrix::LinearOperator,
};
use faer::{Col, ColRef, Mat};

/// Descriptor of the Lanczos tridiagonalization for a fixed `depth`.
///
/// Valid depths satisfy `1 <= depth < n`, where `n` is the dimension of the initial vector.
/// The lower bound is checked by [`LanczosTridiagonal::new`], the upper bound by
/// [`DecompositionAlgorithm::init`] once `n` is known. Both happen before any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanczosTridiagonal {
    depth: usize,
}

impl LanczosTridiagonal {
    /// Creates the descriptor. Fails if `depth < 1`.
    pub fn new(depth: usize) -> Result<Self, DecompError> {
        if depth < 1 {
            return Err(invalid_depth(depth, None));
        }
        Ok(Self { depth })
    }

    /// The requested depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Pre-allocates the state for the initial vector `init_vec`.
    ///
    /// Fails if `depth >= n`, with `n` the dimension of `init_vec`.
    pub fn init(&self, init_vec: ColRef<'_, f64>) -> Result<TridiagonalState, DecompError> {
        let ncols = init_vec.nrows();
        if self.depth >= ncols || self.depth < 1 {
            return Err(invalid_depth(self.depth, Some(ncols)));
        }

        Ok(TridiagonalState {
            i: 0,
            basis: Mat::zeros(self.depth + 1, ncols),
            diag: vec![0.0; self.depth + 1],
            offdiag: vec![0.0; self.depth],
            vec: init_vec.to_owned(),
        })
    }

    /// Discards the iteration index and returns the basis and the tridiagonal matrix.
    pub fn extract(&self, state: TridiagonalState) -> TridiagonalOutput {
        TridiagonalOutput {
            basis: state.basis,
            tridiagonal: SymmetricTridiagonal {
                diag: state.diag,
                offdiag: state.offdiag,
            },
        }
    }

    /// Iteration range `[0, depth + 1)`.
    pub fn lower_upper(&self) -> (usize, usize) {
        (0, self.depth + 1)
    }
}

fn invalid_depth(depth: usize, dimension: Option<usize>) -> DecompError {
    let bound = match dimension {
        Some(n) => format!("1 <= depth < {n} for a problem of dimension {n}"),
        None => "1 <= depth < n".to_string(),
    };
    DecompErrorKind::InvalidDepth {
        depth,
        message: format!("Depth {depth} is invalid for Lanczos tridiagonalization. Expected: {bound}."),
    }
    .into()
}

/// Pre-allocated state of the Lanczos iteration.
#[derive(Debug, Clone)]
pub struct TridiagonalState {
    i: usize,
    basis: Mat<f64>,
    diag: Vec<f64>,
    offdiag: Vec<f64>,
    vec: Col<f64>,
}

impl TridiagonalState {
    /// Number of steps taken so far.
    pub fn iteration(&self) -> usize {
        self.i
    }

    /// The basis, including the zero rows not written yet.
    pub fn basis(&self) -> &Mat<f64> {
        &self.basis
    }
}

impl<Op: LinearOperator + ?Sized> DecompositionAlgorithm<Op> for LanczosTridiagonal {
    type State = TridiagonalState;
    type Output = TridiagonalOutput;

    fn init(&self, init_vec: ColRef<'_, f64>) -> Result<TridiagonalState, DecompError> {
        LanczosTridiagonal::init(self, init_vec)
    }

    fn step(&self, state: TridiagonalState, operator: &Op) -> Result<TridiagonalState, DecompError> {
        let TridiagonalState {
            i,
            mut basis,
            mut diag,
            mut offdiag,
            vec,
        } = state;

        let capacity = basis.nrows();
        if i >= capacity {
            return Err(DecompErrorKind::CapacityExceeded { step: i, capacity }.into());
        }
        if operator.ncols() != vec.nrows() {
            return Err(DecompErrorKind::DimensionMismatch {
                operator_cols: operator.ncols(),
                vector_rows: vec.nrows(),
            }
            .into());
        }
        // The output is projected onto the basis rows, so it must have their length too.
        if operator.nrows() != basis.ncols() {
            return Err(DecompErrorKind::OutputDimensionMismatch {
                operator_rows: operator.nrows(),
                basis_len: basis.ncols(),
            }
            .into());
        }

        // The length of the incoming vector is the off-diagonal coupling to the previous
        // row. It is taken before reorthogonalization, which only removes round-off.
        let (vec, length) = normalize(vec);

        // Reorthogonalize against the whole basis, zero rows included. Unwritten rows give
        // a zero coefficient, so this equals projecting against the valid prefix while
        // every step keeps the same shape.
        let (vec, _) = project_out_rows(vec, basis.as_ref());

        // Normalize again after reorthogonalization.
        let (vec, _) = normalize(vec);
        basis.row_mut(i).copy_from(vec.transpose());

        // Three-term recurrence. At i == 0 the previous row is the last one, which is
        // still zero padding, so the second projection is a no-op.
        let prev = previous_index(i, capacity);
        let next = operator.apply(vec.as_ref());
        let (next, coeff) = project_out(next, basis.row(i).transpose());
        let (next, _) = project_out(next, basis.row(prev).transpose());

        diag[i] = coeff;
        // Step i stores the coupling of rows i - 1 and i in offdiag[i - 1]. At i == 0 that
        // is the norm of the start vector, which lands in the last slot and is overwritten
        // by the final step at i == depth.
        let off = previous_index(i, offdiag.len());
        offdiag[off] = length;

        Ok(TridiagonalState {
            i: i + 1,
            basis,
            diag,
            offdiag,
            vec: next,
        })
    }

    fn extract(&self, state: TridiagonalState) -> TridiagonalOutput {
        LanczosTridiagonal::extract(self, state)
    }

    fn lower_upper(&self) -> (usize, usize) {
        LanczosTridiagonal::lower_upper(self)
    }
}
