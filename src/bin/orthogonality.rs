//! Experiment Runner for Orthogonality Analysis.
//!
//! This executable measures how well full reorthogonalization preserves the orthonormality
//! of the Krylov bases, and how accurately the projected matrix reproduces the operator,
//! across a sweep of decomposition depths. The test operator is a synthetic symmetric
//! matrix with a few significant eigenvalues and a cluster of near-zero ones.

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use faer::Mat;
use krylov_decomp::{
    solvers::{bidiagonalize, tridiagonalize},
    utils::synthetic::{
        orthogonality_loss, random_unit_vector, spectrum_with_significant,
        symmetric_from_eigenvalues,
    },
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::path::PathBuf;

/// The decomposition to analyze.
#[derive(ValueEnum, Clone, Debug, Copy)]
enum Algorithm {
    /// Lanczos tridiagonalization, Q A Qᵗ ≈ T.
    Lanczos,
    /// Golub-Kahan-Lanczos bidiagonalization, Us A Vsᵗ ≈ B.
    GolubKahan,
}

/// Command-line arguments for the orthogonality analysis runner.
#[derive(Parser, Debug)]
#[clap(
    name = "orthogonality-runner",
    about = "Runs an analysis of basis orthogonality and factorization error for Krylov decompositions."
)]
struct OrthoArgs {
    /// The decomposition to run.
    #[clap(long, value_enum)]
    algorithm: Algorithm,
    /// Dimension of the test matrix.
    #[clap(long, default_value_t = 200)]
    n: usize,
    /// Number of significant eigenvalues of the test matrix.
    #[clap(long, default_value_t = 10)]
    significant: usize,
    /// Minimum depth to test.
    #[clap(long, default_value_t = 5)]
    depth_min: usize,
    /// Maximum depth to test.
    #[clap(long, default_value_t = 100)]
    depth_max: usize,
    /// Step size for iterating the depth.
    #[clap(long, default_value_t = 5)]
    depth_step: usize,
    /// Seed of the random test matrix and starting vector.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single row of the output CSV file.
#[derive(Debug, Serialize)]
struct OrthogonalityResult {
    /// The decomposition depth.
    depth: usize,
    /// ||I - Q Qᵗ||_F of the (left) basis.
    ortho_loss_left: f64,
    /// ||I - V Vᵗ||_F of the right basis; equal to the left loss for Lanczos.
    ortho_loss_right: f64,
    /// ||Q A Qᵗ - T||_F, or ||Us A Vsᵗ - B||_F for bidiagonalization.
    factorization_error: f64,
}

/// Lanczos needs at least one off-diagonal entry; GKL accepts depth 0.
fn accepts_depth(algorithm: Algorithm, depth: usize) -> bool {
    match algorithm {
        Algorithm::Lanczos => depth >= 1,
        Algorithm::GolubKahan => true,
    }
}

fn analyze(algorithm: Algorithm, a: &Mat<f64>, depth: usize, seed: u64) -> Result<OrthogonalityResult> {
    let mut rng = StdRng::seed_from_u64(seed);
    let v0 = random_unit_vector(a.nrows(), &mut rng);

    let result = match algorithm {
        Algorithm::Lanczos => {
            let out = tridiagonalize(a, v0.as_ref(), depth)
                .with_context(|| format!("tridiagonalization failed at depth {depth}"))?;
            let q = out.basis.as_ref();
            let projected = q * a * q.transpose();
            let loss = orthogonality_loss(q);
            OrthogonalityResult {
                depth,
                ortho_loss_left: loss,
                ortho_loss_right: loss,
                factorization_error: (projected - out.tridiagonal.to_dense()).norm_l2(),
            }
        }
        Algorithm::GolubKahan => {
            let out = bidiagonalize(a, v0.as_ref(), depth)
                .with_context(|| format!("bidiagonalization failed at depth {depth}"))?;
            let us = out.left_basis.transpose();
            let vs = out.right_basis.as_ref();
            let projected = us * a * vs.transpose();
            OrthogonalityResult {
                depth,
                ortho_loss_left: orthogonality_loss(us),
                ortho_loss_right: orthogonality_loss(vs),
                factorization_error: (projected - out.bidiagonal.to_dense()).norm_l2(),
            }
        }
    };
    Ok(result)
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = OrthoArgs::parse();
    ensure!(args.n >= 2, "--n must be at least 2");
    ensure!(args.depth_step > 0, "--depth-step must be positive");
    ensure!(
        args.significant <= args.n,
        "--significant ({}) cannot exceed --n ({})",
        args.significant,
        args.n
    );
    log::info!(
        "Starting orthogonality analysis for {:?} on n = {} with {} significant eigenvalues",
        args.algorithm,
        args.n,
        args.significant
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let eigenvalues = spectrum_with_significant(args.n, args.significant);
    let a = symmetric_from_eigenvalues(&eigenvalues, &mut rng);

    let mut writer = csv::Writer::from_path(&args.output)?;
    let depth_max = args.depth_max.min(args.n - 1);
    for depth in (args.depth_min..=depth_max).step_by(args.depth_step) {
        if !accepts_depth(args.algorithm, depth) {
            log::info!("Skipping depth = {depth}, not valid for {:?}", args.algorithm);
            continue;
        }
        log::info!("Running for depth = {depth}...");
        let row = analyze(args.algorithm, &a, depth, args.seed.wrapping_add(1))?;
        writer.serialize(row)?;
    }

    writer.flush()?;
    log::info!(
        "Orthogonality analysis complete. Results saved to {:?}.",
        &args.output
    );
    Ok(())
}
