//! Vector primitives shared by the Krylov decompositions.
//!
//! These are the building blocks of full reorthogonalization: normalizing a vector while
//! keeping its length, and classical Gram-Schmidt projections against one reference vector
//! or against every row of a basis matrix.
//!
//! Projecting against all `depth + 1` rows of a pre-allocated basis costs
//! O(depth × n) per call, so a complete decomposition is O(depth² × n). Rows that have not
//! been written yet are zero and contribute a zero coefficient, which is what lets every
//! step of a decomposition run over the full padded basis.

use faer::{Col, ColRef, MatRef, Scale};

/// Divides `vec` by its Euclidean norm and returns the unit vector together with that norm.
///
/// A zero vector is not guarded against: the result is non-finite (`NaN`), and the
/// returned length is `0.0`.
pub fn normalize(vec: Col<f64>) -> (Col<f64>, f64) {
    let length = vec.norm_l2();
    let unit = Col::from_fn(vec.nrows(), |k| vec[k] / length);
    (unit, length)
}

/// Removes the component of `vec` along `reference`.
///
/// Returns the residual `vec - c * reference` and the coefficient `c = <vec, reference>`.
/// `reference` is expected to be either a unit vector or zero.
pub fn project_out(vec: Col<f64>, reference: ColRef<'_, f64>) -> (Col<f64>, f64) {
    debug_assert_eq!(vec.nrows(), reference.nrows());
    let coeff = vec.transpose() * reference;
    (&vec - reference * Scale(coeff), coeff)
}

/// Folds [`project_out`] over the rows of `references`, in order.
///
/// Returns the final residual and the coefficient of each row. This is the full
/// reorthogonalization step when `references` is the whole basis.
pub fn project_out_rows(vec: Col<f64>, references: MatRef<'_, f64>) -> (Col<f64>, Vec<f64>) {
    (0..references.nrows()).fold(
        (vec, Vec::with_capacity(references.nrows())),
        |(residual, mut coeffs), row| {
            let (residual, coeff) = project_out(residual, references.row(row).transpose());
            coeffs.push(coeff);
            (residual, coeffs)
        },
    )
}
