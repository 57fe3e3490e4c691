//! Integration test suite to verify the mathematical correctness of the Krylov decompositions.
//!
//! # Test Methodology
//!
//! Test operators are symmetric matrices `A = Q diag(λ) Qᵗ` with a prescribed spectrum: a
//! few significant eigenvalues `10, 11, ...` and the rest at `0.001`. For every
//! decomposition we check
//! 1.  **Orthogonality** of the returned bases, `Q Qᵗ ≈ I`.
//! 2.  **The factorization identity**: the diagonals of `Q A Qᵗ` (resp. `Us A Vsᵗ`) must match
//!     the returned coefficients before the full dense matrices are compared.
//! 3.  **Round trips** at full depth, where the basis is square and `Qᵗ T Q ≈ A`.
//!
//! Comparisons use `|x - y| <= atol + rtol * |y|` with `atol = rtol = 1e-5`.

use anyhow::{Result, anyhow, ensure};
use faer::{
    Col, ColRef, Mat, MatRef,
    sparse::{SparseColMat, Triplet},
};
use krylov_decomp::{
    algorithms::{
        DecompositionAlgorithm, decompose_fixed, golub_kahan::GolubKahanBidiagonal,
        lanczos::LanczosTridiagonal,
    },
    bidiagonalize, eigh_partial,
    matrix::{FnBiOperator, FnOperator, MatrixFree},
    svd_partial, tridiagonalize,
    utils::synthetic::{random_unit_vector, spectrum_with_significant, symmetric_from_eigenvalues},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const ATOL: f64 = 1e-5;
const RTOL: f64 = 1e-5;

/// Element-wise `|x - y| <= ATOL + RTOL * |y|` for matrices of equal shape.
fn ensure_allclose(received: MatRef<'_, f64>, expected: MatRef<'_, f64>, what: &str) -> Result<()> {
    ensure!(
        received.nrows() == expected.nrows() && received.ncols() == expected.ncols(),
        "{what}: shape ({}, {}) differs from expected ({}, {})",
        received.nrows(),
        received.ncols(),
        expected.nrows(),
        expected.ncols()
    );
    for i in 0..expected.nrows() {
        for j in 0..expected.ncols() {
            let (x, y) = (received[(i, j)], expected[(i, j)]);
            ensure!(
                (x - y).abs() <= ATOL + RTOL * y.abs(),
                "{what}: entry ({i}, {j}) is {x}, expected {y}"
            );
        }
    }
    Ok(())
}

/// Element-wise closeness of a sequence to the `offset`-th diagonal of `m`.
fn ensure_diagonal_matches(m: MatRef<'_, f64>, offset: isize, values: &[f64], what: &str) -> Result<()> {
    for (k, &v) in values.iter().enumerate() {
        let (i, j) = if offset >= 0 {
            (k, k + offset as usize)
        } else {
            (k + (-offset) as usize, k)
        };
        let x = m[(i, j)];
        ensure!(
            (x - v).abs() <= ATOL + RTOL * v.abs(),
            "{what}: diagonal {offset} entry {k} is {x}, expected {v}"
        );
    }
    Ok(())
}

fn identity(n: usize) -> Mat<f64> {
    Mat::identity(n, n)
}

/// The symmetric test matrix of dimension `n` with `num_significant` large eigenvalues.
fn create_problem(n: usize, num_significant: usize, seed: u64) -> (Mat<f64>, Col<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let eigenvalues = spectrum_with_significant(n, num_significant);
    let a = symmetric_from_eigenvalues(&eigenvalues, &mut rng);
    let v0 = random_unit_vector(n, &mut rng);
    (a, v0)
}

#[test]
fn test_lanczos_tridiagonal_max_order() -> Result<()> {
    let n = 6;
    let (a, v0) = create_problem(n, 4, 1);
    let depth = n - 1;

    let out = tridiagonalize(&a, v0.as_ref(), depth)?;
    let q = out.basis.as_ref();

    // Full order: Q is square and orthogonal.
    ensure!(q.nrows() == depth + 1 && q.ncols() == n);
    ensure_allclose((q * q.transpose()).as_ref(), identity(n).as_ref(), "Q Qt")?;
    ensure_allclose((q.transpose() * q).as_ref(), identity(n).as_ref(), "Qt Q")?;

    let t = out.tridiagonal.to_dense();
    let qaqt = q * &a * q.transpose();
    ensure!(t.nrows() == depth + 1 && t.ncols() == depth + 1);

    // Fail early if the (off)diagonals do not coincide.
    ensure_diagonal_matches(qaqt.as_ref(), 0, &out.tridiagonal.diag, "Q A Qt")?;
    ensure_diagonal_matches(qaqt.as_ref(), 1, &out.tridiagonal.offdiag, "Q A Qt")?;
    ensure_diagonal_matches(qaqt.as_ref(), -1, &out.tridiagonal.offdiag, "Q A Qt")?;

    ensure_allclose(qaqt.as_ref(), t.as_ref(), "Q A Qt vs T")?;

    // Decompose, then reconstruct: Qt T Q = A.
    let reconstructed = q.transpose() * &t * q;
    ensure_allclose(reconstructed.as_ref(), a.as_ref(), "Qt T Q vs A")?;
    Ok(())
}

#[test]
fn test_lanczos_tridiagonal() -> Result<()> {
    let n = 50;
    // Roughly 1.5 times the number of significant eigenvalues.
    let depth = 6;
    let (a, v0) = create_problem(n, 4, 1);

    let alg = LanczosTridiagonal::new(depth)?;
    let (lower, upper) = alg.lower_upper();
    let out = decompose_fixed(lower, upper, v0.as_ref(), &a, &alg)?;
    let q = out.basis.as_ref();

    ensure!(q.nrows() == depth + 1 && q.ncols() == n);
    ensure_allclose((q * q.transpose()).as_ref(), identity(depth + 1).as_ref(), "Q Qt")?;

    let t = out.tridiagonal.to_dense();
    let qaqt = q * &a * q.transpose();
    ensure_diagonal_matches(qaqt.as_ref(), 0, &out.tridiagonal.diag, "Q A Qt")?;
    ensure_diagonal_matches(qaqt.as_ref(), 1, &out.tridiagonal.offdiag, "Q A Qt")?;
    ensure_diagonal_matches(qaqt.as_ref(), -1, &out.tridiagonal.offdiag, "Q A Qt")?;
    ensure_allclose(qaqt.as_ref(), t.as_ref(), "Q A Qt vs T")?;
    Ok(())
}

#[test]
fn test_lanczos_tridiagonal_error_for_too_high_order() -> Result<()> {
    let n = 6;
    let (a, v0) = create_problem(n, 4, 1);

    let alg = LanczosTridiagonal::new(n + 10)?;
    let err = decompose_fixed(0, n + 10, v0.as_ref(), &a, &alg).unwrap_err();
    ensure!(err.is_invalid_depth(), "unexpected error: {err}");

    let alg = LanczosTridiagonal::new(n)?;
    let err = decompose_fixed(0, n + 1, v0.as_ref(), &a, &alg).unwrap_err();
    ensure!(err.is_invalid_depth(), "unexpected error: {err}");

    ensure!(LanczosTridiagonal::new(0).unwrap_err().is_invalid_depth());
    Ok(())
}

#[test]
fn test_lanczos_tridiagonal_error_for_too_many_steps() -> Result<()> {
    let n = 6;
    let depth = n - 1;
    let (a, v0) = create_problem(n, 4, 1);

    let alg = LanczosTridiagonal::new(depth)?;
    let err = decompose_fixed(0, depth + 2, v0.as_ref(), &a, &alg).unwrap_err();
    ensure!(err.is_capacity_exceeded(), "unexpected error: {err}");
    Ok(())
}

#[test]
fn test_golub_kahan_lanczos_bidiagonal() -> Result<()> {
    let n = 50;
    let depth = 6;
    let (a, v0) = create_problem(n, 4, 1);

    let op = FnBiOperator::new(
        n,
        n,
        |v: ColRef<'_, f64>| &a * v,
        |v: ColRef<'_, f64>| a.transpose() * v,
    );

    let alg = GolubKahanBidiagonal::new(depth, (n, n))?;
    let (lower, upper) = alg.lower_upper();
    let out = decompose_fixed(lower, upper, v0.as_ref(), &op, &alg)?;

    // Left basis is stored by columns, right basis by rows.
    let us = out.left_basis.transpose();
    let vs = out.right_basis.as_ref();
    ensure!(us.nrows() == depth + 1 && us.ncols() == n);
    ensure!(vs.nrows() == depth + 1 && vs.ncols() == n);
    ensure_allclose((us * us.transpose()).as_ref(), identity(depth + 1).as_ref(), "Us Ust")?;
    ensure_allclose((vs * vs.transpose()).as_ref(), identity(depth + 1).as_ref(), "Vs Vst")?;

    let uavt = us * &a * vs.transpose();
    ensure_diagonal_matches(uavt.as_ref(), 0, &out.bidiagonal.diag, "Us A Vst")?;
    ensure_diagonal_matches(uavt.as_ref(), 1, &out.bidiagonal.superdiag, "Us A Vst")?;

    let b = out.bidiagonal.to_dense();
    ensure!(b.nrows() == depth + 1 && b.ncols() == depth + 1);
    ensure_allclose(uavt.as_ref(), b.as_ref(), "Us A Vst vs B")?;

    // A Vst = Ust B
    let avt = &a * vs.transpose();
    let utb = &out.left_basis * &b;
    ensure_allclose(avt.as_ref(), utb.as_ref(), "A Vst vs Ust B")?;

    // At Ust = Vst Bt + beta * v e_lastᵗ
    let atut = a.transpose() * &out.left_basis;
    let beta = out.residual.beta;
    let v = &out.residual.vector;
    let correction = Mat::from_fn(n, depth + 1, |i, j| if j == depth { beta * v[i] } else { 0.0 });
    let vtbt = vs.transpose() * b.transpose() + correction;
    ensure_allclose(atut.as_ref(), vtbt.as_ref(), "At Ust vs Vst Bt + beta v e")?;
    Ok(())
}

#[test]
fn test_golub_kahan_lanczos_error_for_invalid_depth() -> Result<()> {
    let err = GolubKahanBidiagonal::new(6, (6, 8)).unwrap_err();
    ensure!(err.is_invalid_depth());
    ensure!(err.to_string().contains("Depth 6"), "message was: {err}");
    ensure!(err.to_string().contains("= 5"), "message was: {err}");
    ensure!(GolubKahanBidiagonal::new(5, (6, 8)).is_ok());
    Ok(())
}

#[test]
fn test_svd_partial_full_depth_reconstructs_matrix() -> Result<()> {
    let (nrows, ncols) = (8, 6);
    let mut rng = StdRng::seed_from_u64(5);
    let a = Mat::from_fn(nrows, ncols, |_, _| rng.random_range(-1.0..1.0));
    let v0 = random_unit_vector(ncols, &mut rng);

    let svd = svd_partial(&a, v0.as_ref(), ncols - 1)?;
    ensure!(svd.u.nrows() == nrows && svd.u.ncols() == ncols);
    ensure!(svd.vt.nrows() == ncols && svd.vt.ncols() == ncols);
    ensure!(svd.s.windows(2).all(|w| w[0] >= w[1]), "singular values not sorted");

    let us = Mat::from_fn(nrows, ncols, |i, j| svd.u[(i, j)] * svd.s[j]);
    let reconstructed = &us * &svd.vt;
    ensure_allclose(reconstructed.as_ref(), a.as_ref(), "u s vt vs A")?;
    Ok(())
}

#[test]
fn test_eigh_partial_finds_significant_eigenvalues() -> Result<()> {
    let n = 50;
    let depth = 6;
    let (a, v0) = create_problem(n, 4, 2);

    let eig = eigh_partial(&a, v0.as_ref(), depth)?;
    ensure!(eig.eigenvalues.len() == depth + 1);

    let top = &eig.eigenvalues[depth - 3..];
    for (received, expected) in top.iter().zip([10.0, 11.0, 12.0, 13.0]) {
        ensure!(
            (received - expected).abs() < 1e-6,
            "Ritz value {received} does not match eigenvalue {expected}"
        );
    }

    // The Ritz vector of the largest Ritz value is an eigenvector of A.
    let x = eig.eigenvectors.col(depth);
    let ax = &a * x;
    let residual = Col::from_fn(n, |i| ax[i] - 13.0 * x[i]);
    ensure!(residual.norm_l2() < 1e-6, "eigen-residual {}", residual.norm_l2());
    Ok(())
}

#[test]
fn test_operator_representations_agree() -> Result<()> {
    let n = 20;
    let depth = 8;
    // Distinct eigenvalues keep the Krylov space of v0 at full dimension, so every basis
    // row is determined by the operator and not by round-off.
    let mut rng = StdRng::seed_from_u64(3);
    let eigenvalues: Vec<f64> = (1..=n).map(|k| k as f64).collect();
    let a = symmetric_from_eigenvalues(&eigenvalues, &mut rng);
    let v0 = random_unit_vector(n, &mut rng);

    // Same matrix as a sparse operator (with every entry stored).
    let triplets: Vec<_> = (0..n)
        .flat_map(|j| (0..n).map(move |i| (i, j)))
        .map(|(i, j)| Triplet::new(i, j, a[(i, j)]))
        .collect();
    let sparse = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets)
        .map_err(|e| anyhow!("sparse matrix construction failed: {e:?}"))?;
    let sparse_op = MatrixFree(sparse.as_ref());
    let closure_op = FnOperator::new(n, n, |v: ColRef<'_, f64>| &a * v);

    let dense = tridiagonalize(&a, v0.as_ref(), depth)?;
    let via_sparse = tridiagonalize(&sparse_op, v0.as_ref(), depth)?;
    let via_closure = tridiagonalize(&closure_op, v0.as_ref(), depth)?;

    for other in [&via_sparse, &via_closure] {
        ensure_allclose(other.basis.as_ref(), dense.basis.as_ref(), "basis")?;
        ensure_allclose(
            other.tridiagonal.to_dense().as_ref(),
            dense.tridiagonal.to_dense().as_ref(),
            "tridiagonal",
        )?;
    }

    let bidiag_dense = bidiagonalize(&a, v0.as_ref(), depth)?;
    let bidiag_sparse = bidiagonalize(&sparse_op, v0.as_ref(), depth)?;
    ensure_allclose(
        bidiag_sparse.bidiagonal.to_dense().as_ref(),
        bidiag_dense.bidiagonal.to_dense().as_ref(),
        "bidiagonal",
    )?;
    Ok(())
}

#[test]
fn test_stepwise_driving_matches_driver() -> Result<()> {
    let n = 12;
    let depth = 4;
    let (a, v0) = create_problem(n, 3, 4);

    let alg = LanczosTridiagonal::new(depth)?;
    let mut state = alg.init(v0.as_ref())?;
    for k in 0..=depth {
        ensure!(state.iteration() == k);
        // Rows from the current index on are still zero padding.
        for row in k..=depth {
            ensure!(state.basis().row(row).norm_l2() == 0.0);
        }
        state = DecompositionAlgorithm::<Mat<f64>>::step(&alg, state, &a)?;
    }
    let stepped = alg.extract(state);
    let driven = tridiagonalize(&a, v0.as_ref(), depth)?;

    ensure!(stepped.tridiagonal == driven.tridiagonal);
    ensure!(stepped.basis == driven.basis);
    Ok(())
}
