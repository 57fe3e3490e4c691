//! Golub-Kahan-Lanczos bidiagonalization with pre-allocation and full reorthogonalization.
//!
//! Decomposes a general `nrows × ncols` operator into `U B Vᵗ`, with `U` and `V`
//! orthonormal and `B` upper bidiagonal. Use it for approximate singular value
//! decompositions. Both bases are pre-allocated with `depth + 1` zero rows, and each new
//! left (right) vector is reorthogonalized against every row of the left (right) basis.

use super::{
    BidiagonalOutput, DecompositionAlgorithm, Residual, UpperBidiagonal,
    orthogonalize::{normalize, project_out_rows},
    previous_index,
};
use crate::{
    error::{DecompError, DecompErrorKind},
    matrix::TransposeOperator,
};
use faer::{Col, ColRef, Mat, Scale};

/// Descriptor of the Golub-Kahan-Lanczos bidiagonalization for a fixed `depth` and
/// operator shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GolubKahanBidiagonal {
    depth: usize,
    nrows: usize,
    ncols: usize,
}

impl GolubKahanBidiagonal {
    /// Creates the descriptor for an operator of shape `(nrows, ncols)`.
    ///
    /// Fails unless `0 <= depth <= min(nrows, ncols) - 1`.
    pub fn new(depth: usize, (nrows, ncols): (usize, usize)) -> Result<Self, DecompError> {
        let in_range = match nrows.min(ncols).checked_sub(1) {
            Some(max_depth) => depth <= max_depth,
            None => false,
        };
        if !in_range {
            let max_depth = nrows.min(ncols) as isize - 1;
            return Err(DecompErrorKind::InvalidDepth {
                depth,
                message: format!(
                    "Depth {depth} exceeds the matrix' dimensions. \
                     Expected: 0 <= depth <= min(nrows, ncols) - 1 = {max_depth} \
                     for a matrix with shape ({nrows}, {ncols})."
                ),
            }
            .into());
        }
        Ok(Self {
            depth,
            nrows,
            ncols,
        })
    }

    /// The requested depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The operator shape `(nrows, ncols)` the descriptor was built for.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Pre-allocates the state and normalizes the initial right vector `init_vec`.
    pub fn init(&self, init_vec: ColRef<'_, f64>) -> Result<BidiagonalState, DecompError> {
        if init_vec.nrows() != self.ncols {
            return Err(DecompErrorKind::DimensionMismatch {
                operator_cols: self.ncols,
                vector_rows: init_vec.nrows(),
            }
            .into());
        }
        let (v0, _) = normalize(init_vec.to_owned());
        Ok(BidiagonalState {
            i: 0,
            us: Mat::zeros(self.depth + 1, self.nrows),
            vs: Mat::zeros(self.depth + 1, self.ncols),
            alphas: vec![0.0; self.depth + 1],
            betas: vec![0.0; self.depth + 1],
            beta: 0.0,
            vk: v0,
        })
    }

    /// Returns the left basis as columns, the bidiagonal matrix, the right basis as rows,
    /// and the trailing `(beta, v)` pair.
    ///
    /// The first stored beta is the initial coupling (zero) and is not part of `B`.
    pub fn extract(&self, state: BidiagonalState) -> BidiagonalOutput {
        let BidiagonalState {
            us,
            vs,
            alphas,
            mut betas,
            beta,
            vk,
            ..
        } = state;
        betas.remove(0);
        BidiagonalOutput {
            left_basis: us.transpose().to_owned(),
            bidiagonal: UpperBidiagonal {
                diag: alphas,
                superdiag: betas,
            },
            right_basis: vs,
            residual: Residual { beta, vector: vk },
        }
    }

    /// Iteration range `[0, depth + 1)`.
    pub fn lower_upper(&self) -> (usize, usize) {
        (0, self.depth + 1)
    }
}

/// Pre-allocated state of the Golub-Kahan-Lanczos iteration.
#[derive(Debug, Clone)]
pub struct BidiagonalState {
    i: usize,
    us: Mat<f64>,
    vs: Mat<f64>,
    alphas: Vec<f64>,
    betas: Vec<f64>,
    beta: f64,
    vk: Col<f64>,
}

impl BidiagonalState {
    /// Number of steps taken so far.
    pub fn iteration(&self) -> usize {
        self.i
    }

    /// The left basis (one vector per row), including unwritten zero rows.
    pub fn left_basis(&self) -> &Mat<f64> {
        &self.us
    }

    /// The right basis (one vector per row), including unwritten zero rows.
    pub fn right_basis(&self) -> &Mat<f64> {
        &self.vs
    }
}

impl<Op: TransposeOperator + ?Sized> DecompositionAlgorithm<Op> for GolubKahanBidiagonal {
    type State = BidiagonalState;
    type Output = BidiagonalOutput;

    fn init(&self, init_vec: ColRef<'_, f64>) -> Result<BidiagonalState, DecompError> {
        GolubKahanBidiagonal::init(self, init_vec)
    }

    fn step(&self, state: BidiagonalState, operator: &Op) -> Result<BidiagonalState, DecompError> {
        let BidiagonalState {
            i,
            mut us,
            mut vs,
            mut alphas,
            mut betas,
            beta,
            vk,
        } = state;

        let capacity = vs.nrows();
        if i >= capacity {
            return Err(DecompErrorKind::CapacityExceeded { step: i, capacity }.into());
        }
        if operator.ncols() != vk.nrows() {
            return Err(DecompErrorKind::DimensionMismatch {
                operator_cols: operator.ncols(),
                vector_rows: vk.nrows(),
            }
            .into());
        }
        if operator.nrows() != us.ncols() {
            return Err(DecompErrorKind::OutputDimensionMismatch {
                operator_rows: operator.nrows(),
                basis_len: us.ncols(),
            }
            .into());
        }

        // The right vector and its coupling to the previous left vector come from the
        // previous step. At i == 0 the coupling is zero.
        vs.row_mut(i).copy_from(vk.transpose());
        betas[i] = beta;

        // u_i = A v_i - beta u_{i-1}. At i == 0 the previous left row is the last one,
        // which is still zero padding, so nothing is subtracted.
        let prev = previous_index(i, capacity);
        let av = operator.apply(vk.as_ref());
        let uk = &av - us.row(prev).transpose() * Scale(beta);
        let (uk, alpha) = normalize(uk);

        // Full reorthogonalization against the padded left basis, then renormalize.
        let (uk, _) = project_out_rows(uk, us.as_ref());
        let (uk, _) = normalize(uk);
        us.row_mut(i).copy_from(uk.transpose());
        alphas[i] = alpha;

        // v_{i+1} = Aᵗ u_i - alpha v_i. It is stored at the start of the next step; after
        // the last step it is returned as the residual direction.
        let va = operator.apply_transpose(uk.as_ref());
        let vk = &va - &vk * Scale(alpha);
        let (vk, beta) = normalize(vk);
        let (vk, _) = project_out_rows(vk, vs.as_ref());
        let (vk, _) = normalize(vk);

        Ok(BidiagonalState {
            i: i + 1,
            us,
            vs,
            alphas,
            betas,
            beta,
            vk,
        })
    }

    fn extract(&self, state: BidiagonalState) -> BidiagonalOutput {
        GolubKahanBidiagonal::extract(self, state)
    }

    fn lower_upper(&self) -> (usize, usize) {
        GolubKahanBidiagonal::lower_upper(self)
    }
}
