//! Helpers shared by the experiment runner and the test suites.
//!
//! - **`synthetic`**: builds symmetric test matrices with a prescribed spectrum, random
//!   starting vectors, and the residual metrics used to judge a decomposition
//!   (orthogonality loss and factorization error).

pub mod synthetic;
