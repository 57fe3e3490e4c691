//! This module provides a high-level API for decomposing matrix-free operators and for
//! turning the decompositions into approximate spectral factorizations.
//!
//! [`tridiagonalize`] and [`bidiagonalize`] build the matching descriptor and drive it over
//! its declared iteration range. [`eigh_partial`] and [`svd_partial`] hand the small
//! projected matrix to [`faer`]'s dense solvers and rotate the result back with the
//! Krylov bases.

use crate::{
    algorithms::{
        BidiagonalOutput, TridiagonalOutput, decompose_fixed,
        golub_kahan::GolubKahanBidiagonal, lanczos::LanczosTridiagonal,
    },
    error::{DecompError, DecompErrorKind},
    matrix::{LinearOperator, TransposeOperator},
};
use faer::{ColRef, Mat, MatRef, Side};

/// Runs Lanczos tridiagonalization of the symmetric `operator` from `v0` to `depth`.
///
/// # Arguments
/// * `operator`: A symmetric linear operator implementing [`LinearOperator`].
/// * `v0`: The starting vector. Must not be a zero vector.
/// * `depth`: Number of iterations minus one, `1 <= depth < n`.
///
/// # Returns
/// The `(depth + 1) × n` orthonormal basis and the symmetric tridiagonal projection.
pub fn tridiagonalize<O>(
    operator: &O,
    v0: ColRef<'_, f64>,
    depth: usize,
) -> Result<TridiagonalOutput, DecompError>
where
    O: LinearOperator + ?Sized,
{
    let alg = LanczosTridiagonal::new(depth)?;
    let (lower, upper) = alg.lower_upper();
    decompose_fixed(lower, upper, v0, operator, &alg)
}

/// Runs Golub-Kahan-Lanczos bidiagonalization of `operator` from the right vector `v0`.
///
/// # Arguments
/// * `operator`: A linear operator with a transposed action, see [`TransposeOperator`].
/// * `v0`: The starting vector of length `ncols`. Must not be a zero vector.
/// * `depth`: Number of iterations minus one, `0 <= depth <= min(nrows, ncols) - 1`.
pub fn bidiagonalize<O>(
    operator: &O,
    v0: ColRef<'_, f64>,
    depth: usize,
) -> Result<BidiagonalOutput, DecompError>
where
    O: TransposeOperator + ?Sized,
{
    let alg = GolubKahanBidiagonal::new(depth, (operator.nrows(), operator.ncols()))?;
    let (lower, upper) = alg.lower_upper();
    decompose_fixed(lower, upper, v0, operator, &alg)
}

/// Approximate leading singular triplets `A ≈ u diag(s) vt`.
#[derive(Debug, Clone)]
pub struct PartialSvd {
    /// Left singular vectors as columns, `nrows × (depth + 1)`.
    pub u: Mat<f64>,
    /// Singular values in non-increasing order.
    pub s: Vec<f64>,
    /// Right singular vectors as rows, `(depth + 1) × ncols`.
    pub vt: Mat<f64>,
}

/// Approximate eigenpairs (Ritz pairs) of a symmetric operator.
#[derive(Debug, Clone)]
pub struct PartialEigen {
    /// Ritz values in non-decreasing order.
    pub eigenvalues: Vec<f64>,
    /// Ritz vectors as columns, `n × (depth + 1)`.
    pub eigenvectors: Mat<f64>,
}

/// Partial singular value decomposition.
///
/// Bidiagonalizes `operator` to `depth`, computes the thin SVD `B = P S Qᵗ` of the small
/// bidiagonal matrix and combines the orthogonal factors: `u = U P`, `vt = Qᵗ V`.
/// With `depth = min(nrows, ncols) - 1` this matches a full thin SVD.
pub fn svd_partial<O>(
    operator: &O,
    v0: ColRef<'_, f64>,
    depth: usize,
) -> Result<PartialSvd, DecompError>
where
    O: TransposeOperator + ?Sized,
{
    let output = bidiagonalize(operator, v0, depth)?;
    let b = output.bidiagonal.to_dense();

    let svd = b
        .as_ref()
        .thin_svd()
        .map_err(|e| DecompError::from(DecompErrorKind::SvdError(e)))?;
    let s_diag = svd.S();
    let values: Vec<f64> = (0..b.nrows()).map(|i| s_diag[i]).collect();
    let order = sorted_order(&values, |a, b| b.total_cmp(a));

    let p = permute_columns(svd.U(), &order);
    let q = permute_columns(svd.V(), &order);

    Ok(PartialSvd {
        u: &output.left_basis * &p,
        s: order.iter().map(|&i| values[i]).collect(),
        vt: q.transpose() * &output.right_basis,
    })
}

/// Partial symmetric eigendecomposition.
///
/// Tridiagonalizes `operator` to `depth`, diagonalizes the small tridiagonal matrix and
/// rotates its eigenvectors into the original space with the Lanczos basis.
pub fn eigh_partial<O>(
    operator: &O,
    v0: ColRef<'_, f64>,
    depth: usize,
) -> Result<PartialEigen, DecompError>
where
    O: LinearOperator + ?Sized,
{
    let output = tridiagonalize(operator, v0, depth)?;
    let t = output.tridiagonal.to_dense();

    let evd = t
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| DecompError::from(DecompErrorKind::EvdError(e)))?;
    let s_diag = evd.S();
    let values: Vec<f64> = (0..t.nrows()).map(|i| s_diag[i]).collect();
    let order = sorted_order(&values, |a, b| a.total_cmp(b));

    let w = permute_columns(evd.U(), &order);

    Ok(PartialEigen {
        eigenvalues: order.iter().map(|&i| values[i]).collect(),
        eigenvectors: output.basis.transpose() * &w,
    })
}

fn sorted_order(values: &[f64], cmp: impl Fn(&f64, &f64) -> std::cmp::Ordering) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| cmp(&values[i], &values[j]));
    order
}

fn permute_columns(m: MatRef<'_, f64>, order: &[usize]) -> Mat<f64> {
    Mat::from_fn(m.nrows(), order.len(), |i, j| m[(i, order[j])])
}
