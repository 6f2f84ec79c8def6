//! Least squares solver.
//!
//! We solve
//!
//! ```text
//! minimize ‖X w − y‖²
//! ```
//!
//! with one of five interchangeable strategies:
//!
//! - `normal` / `cholesky`: factor `XᵗX = L Lᵗ` and do two triangular solves.
//!   Cheapest, but squares the condition number and fails on rank-deficient `X`.
//! - `qr`: `R z = Qᵗ y` on the column-pivoted thin QR `X P = Q R`, then
//!   `w = P z`. Never forms `XᵗX`; on rank-deficient `X` it returns a basic
//!   solution (dependent columns get zero weight) with the least-squares
//!   residual.
//! - `svd`: `w = V Σ⁺ Uᵗ y`. The only path that returns the minimum-norm
//!   solution when `X` is rank deficient.
//! - `gradient`: mini-batch gradient descent on `½ · mean((Xw − y)²)`.
//!
//! With `with_bias` a column of ones is appended, so the intercept is the last
//! entry of the returned weights.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::domain::{GradientConfig, LinearConfig, LinearSolver};
use crate::error::{EstimatorError, Result};
use crate::fit::{MeanSquaredError, optimize, validate};
use crate::math::decomp;
use crate::math::dense::{
    design_matrix, ensure_finite, ensure_fit_shape, ensure_same_rows, gram, xt_y,
};

/// Solve with the given method; the `gradient` method uses default hyperparameters.
pub fn solve(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    method: LinearSolver,
    with_bias: bool,
) -> Result<DVector<f64>> {
    solve_with_gradient(x, y, method, with_bias, &GradientConfig::default())
}

/// Solve with everything taken from a [`LinearConfig`].
pub fn solve_with_config(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    config: &LinearConfig,
) -> Result<DVector<f64>> {
    solve_with_gradient(x, y, config.solver, config.with_bias, &config.gradient)
}

fn solve_with_gradient(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    method: LinearSolver,
    with_bias: bool,
    gradient: &GradientConfig,
) -> Result<DVector<f64>> {
    ensure_same_rows(x, y)?;
    ensure_fit_shape(x, with_bias)?;
    if method == LinearSolver::Gradient {
        validate(gradient)?;
    }
    ensure_finite(x.iter(), "X")?;
    ensure_finite(y.iter(), "y")?;

    let design = design_matrix(x, with_bias);
    debug!(
        "least squares: method={method} n_samples={} n_params={}",
        design.nrows(),
        design.ncols()
    );

    match method {
        LinearSolver::Normal | LinearSolver::Cholesky => solve_normal(&design, y),
        LinearSolver::Qr => solve_qr(&design, y),
        LinearSolver::Svd => solve_svd(&design, y),
        LinearSolver::Gradient => Ok(optimize(&design, y, &MeanSquaredError, gradient)?.weights),
    }
}

/// Normal equations via Cholesky.
pub fn solve_normal(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let (n, p) = x.shape();
    if n < p {
        return Err(EstimatorError::SingularMatrix(format!(
            "XᵗX is singular: {n} samples for {p} parameters"
        )));
    }

    let l = decomp::cholesky(&gram(x)).map_err(|e| match e {
        EstimatorError::NotPositiveDefinite { index, pivot } => EstimatorError::SingularMatrix(
            format!("XᵗX is not positive definite (pivot {index} = {pivot:e})"),
        ),
        other => other,
    })?;
    let z = decomp::solve_lower(&l, &xt_y(x, y))?;
    decomp::solve_upper(&l.transpose(), &z)
}

/// Column-pivoted QR; columns past the numerical rank get zero weight.
pub fn solve_qr(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let f = decomp::qr(x);
    let qty = f.q.tr_mul(y);
    let mut w = decomp::solve_upper_truncated(&f.r, &qty)?;
    f.unpivot(&mut w);
    Ok(w)
}

/// SVD pseudo-inverse.
pub fn solve_svd(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let f = decomp::svd(x)?;
    decomp::pinv_solve(&f, y)
}
