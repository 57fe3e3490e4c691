//! Synthetic test problems with a known spectrum.
//!
//! A symmetric matrix `A = Q diag(λ) Qᵗ` is assembled from a random orthogonal `Q`
//! (the thin QR factor of a random square matrix). Its eigenvalues are exactly the
//! prescribed `λ`, which makes it easy to judge how well a Krylov decomposition captures
//! the dominant part of the spectrum.

use faer::{Col, Mat, MatRef};
use rand::Rng;

/// A spectrum of dimension `n` whose first `num_significant` eigenvalues are
/// `10, 11, 12, ...` and whose remaining eigenvalues are `0.001`.
pub fn spectrum_with_significant(n: usize, num_significant: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            if i < num_significant {
                10.0 + i as f64
            } else {
                0.001
            }
        })
        .collect()
}

/// A random `n × n` orthogonal matrix.
pub fn random_orthogonal<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Mat<f64> {
    let m = Mat::from_fn(n, n, |_, _| rng.random_range(-1.0..1.0));
    m.qr().compute_thin_Q()
}

/// Builds the symmetric matrix `Q diag(eigenvalues) Qᵗ` for a random orthogonal `Q`.
pub fn symmetric_from_eigenvalues<R: Rng + ?Sized>(eigenvalues: &[f64], rng: &mut R) -> Mat<f64> {
    let n = eigenvalues.len();
    let q = random_orthogonal(n, rng);
    let scaled = Mat::from_fn(n, n, |i, j| q[(i, j)] * eigenvalues[j]);
    let a = &scaled * q.transpose();
    // Remove the round-off asymmetry of the product.
    Mat::from_fn(n, n, |i, j| 0.5 * (a[(i, j)] + a[(j, i)]))
}

/// A random vector of unit Euclidean length.
pub fn random_unit_vector<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Col<f64> {
    let v = Col::from_fn(n, |_| rng.random_range(-1.0..1.0));
    let norm = v.norm_l2();
    Col::from_fn(n, |i| v[i] / norm)
}

/// Loss of orthogonality `‖I − Q Qᵗ‖_F` of a basis stored one vector per row.
pub fn orthogonality_loss(rows: MatRef<'_, f64>) -> f64 {
    let k = rows.nrows();
    let gram = rows * rows.transpose();
    (Mat::<f64>::identity(k, k) - gram).norm_l2()
}
