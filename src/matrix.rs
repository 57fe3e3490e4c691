//! This module defines the operator abstraction consumed by the decompositions.
//!
//! Krylov methods never look at individual matrix entries. Lanczos tridiagonalization
//! only needs the product `A @ x`, and Golub-Kahan-Lanczos bidiagonalization additionally
//! needs the transposed action `x @ A`. The algorithms are therefore written against the
//! two traits below, and any object able to perform these products can be decomposed:
//! dense matrices, [`faer`] sparse matrices, or plain closures.
//!
//! Callers must guarantee that an operator is linear, deterministic and free of side
//! effects, and that the dimensions it reports match the products it computes.

use faer::{
    Col, ColRef, Mat, MatMut, MatRef, Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::{BiLinOp, LinOp},
    prelude::Reborrow,
};

/// A linear operator `x -> A @ x` on dense real vectors.
///
/// # Example
///
/// ```
/// use faer::{Col, mat};
/// use krylov_decomp::matrix::LinearOperator;
///
/// let a = mat![[2.0, -1.0], [-1.0, 2.0]];
/// let x = Col::from_fn(2, |i| (i + 1) as f64);
/// let y = a.apply(x.as_ref());
/// assert_eq!(y[0], 0.0);
/// assert_eq!(y[1], 3.0);
/// ```
pub trait LinearOperator {
    /// Returns the number of rows of the operator.
    fn nrows(&self) -> usize;

    /// Returns the number of columns of the operator.
    fn ncols(&self) -> usize;

    /// Applies the operator to `rhs`, returning `A @ rhs`.
    ///
    /// # Panics
    ///
    /// Dense implementations panic if `rhs.nrows() != self.ncols()`.
    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64>;
}

/// A linear operator that can also be applied from the left, `x -> x @ A`.
pub trait TransposeOperator: LinearOperator {
    /// Applies the transpose of the operator to `rhs`, returning `Aᵗ @ rhs`.
    fn apply_transpose(&self, rhs: ColRef<'_, f64>) -> Col<f64>;
}

impl LinearOperator for MatRef<'_, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        MatRef::nrows(self)
    }

    #[inline]
    fn ncols(&self) -> usize {
        MatRef::ncols(self)
    }

    #[inline]
    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        assert_eq!(
            MatRef::ncols(self),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            MatRef::ncols(self),
            rhs.nrows(),
        );
        *self * rhs
    }
}

impl TransposeOperator for MatRef<'_, f64> {
    #[inline]
    fn apply_transpose(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        assert_eq!(
            MatRef::nrows(self),
            rhs.nrows(),
            "Dimension mismatch: operator rows ({}) do not match vector rows ({}).",
            MatRef::nrows(self),
            rhs.nrows(),
        );
        self.transpose() * rhs
    }
}

impl LinearOperator for MatMut<'_, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.rb().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.rb().ncols()
    }

    #[inline]
    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        LinearOperator::apply(&self.rb(), rhs)
    }
}

impl TransposeOperator for MatMut<'_, f64> {
    #[inline]
    fn apply_transpose(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        self.rb().apply_transpose(rhs)
    }
}

impl LinearOperator for Mat<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    #[inline]
    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        LinearOperator::apply(&self.as_ref(), rhs)
    }
}

impl TransposeOperator for Mat<f64> {
    #[inline]
    fn apply_transpose(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        self.as_ref().apply_transpose(rhs)
    }
}

/// An operator given by a single matrix-vector product callback and a declared shape.
pub struct FnOperator<F> {
    nrows: usize,
    ncols: usize,
    av: F,
}

impl<F> FnOperator<F>
where
    F: Fn(ColRef<'_, f64>) -> Col<f64>,
{
    /// Wraps `av` as an operator of shape `(nrows, ncols)`.
    pub fn new(nrows: usize, ncols: usize, av: F) -> Self {
        Self { nrows, ncols, av }
    }
}

impl<F> LinearOperator for FnOperator<F>
where
    F: Fn(ColRef<'_, f64>) -> Col<f64>,
{
    fn nrows(&self) -> usize {
        self.nrows
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        (self.av)(rhs)
    }
}

/// An operator given by a matrix-vector callback `Av` and a vector-matrix callback `vA`.
pub struct FnBiOperator<F, G> {
    nrows: usize,
    ncols: usize,
    av: F,
    va: G,
}

impl<F, G> FnBiOperator<F, G>
where
    F: Fn(ColRef<'_, f64>) -> Col<f64>,
    G: Fn(ColRef<'_, f64>) -> Col<f64>,
{
    /// Wraps `av` (computing `A @ x`) and `va` (computing `x @ A`) as an operator of shape
    /// `(nrows, ncols)`.
    pub fn new(nrows: usize, ncols: usize, av: F, va: G) -> Self {
        Self {
            nrows,
            ncols,
            av,
            va,
        }
    }
}

impl<F, G> LinearOperator for FnBiOperator<F, G>
where
    F: Fn(ColRef<'_, f64>) -> Col<f64>,
    G: Fn(ColRef<'_, f64>) -> Col<f64>,
{
    fn nrows(&self) -> usize {
        self.nrows
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        (self.av)(rhs)
    }
}

impl<F, G> TransposeOperator for FnBiOperator<F, G>
where
    F: Fn(ColRef<'_, f64>) -> Col<f64>,
    G: Fn(ColRef<'_, f64>) -> Col<f64>,
{
    fn apply_transpose(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        (self.va)(rhs)
    }
}

/// Adapts any [`faer`] matrix-free operator ([`LinOp`], and [`BiLinOp`] for the transposed
/// action) such as a `SparseColMatRef`.
///
/// Every product allocates a [`MemBuffer`] sized by the operator's scratch requirements and
/// runs sequentially.
#[derive(Debug, Clone, Copy)]
pub struct MatrixFree<O>(pub O);

impl<O: LinOp<f64>> LinearOperator for MatrixFree<O> {
    fn nrows(&self) -> usize {
        self.0.nrows()
    }

    fn ncols(&self) -> usize {
        self.0.ncols()
    }

    fn apply(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        let mut out = Col::<f64>::zeros(self.0.nrows());
        let mut mem = MemBuffer::new(self.0.apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);
        self.0.apply(out.as_mat_mut(), rhs.as_mat(), Par::Seq, stack);
        out
    }
}

impl<O: BiLinOp<f64>> TransposeOperator for MatrixFree<O> {
    fn apply_transpose(&self, rhs: ColRef<'_, f64>) -> Col<f64> {
        let mut out = Col::<f64>::zeros(self.0.ncols());
        let mut mem = MemBuffer::new(self.0.transpose_apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);
        self.0
            .transpose_apply(out.as_mat_mut(), rhs.as_mat(), Par::Seq, stack);
        out
    }
}
