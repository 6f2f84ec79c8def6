//! Differentiable objectives for the gradient descent optimizer.
//!
//! Both objectives here are "linear model" losses: the per-sample loss depends
//! on the margin `z_i = x_iᵗ w` only, so the gradient is `Σ r_i x_i / m` for a
//! per-sample residual `r_i`. Batch sums are computed over fixed-size row
//! chunks in parallel and reduced in chunk order, which keeps results
//! bit-identical for any thread pool size.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::math::{log_loss, row_dot, sigmoid};

/// Rows per parallel work unit.
const CHUNK_ROWS: usize = 256;

/// A loss over a subset of rows, with its gradient with respect to the weights.
pub trait Objective: Sync {
    /// Mean loss over `rows`.
    fn loss(&self, x: &DMatrix<f64>, y: &DVector<f64>, w: &DVector<f64>, rows: &[usize]) -> f64;

    /// Gradient of [`Objective::loss`] over `rows`.
    fn gradient(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        w: &DVector<f64>,
        rows: &[usize],
    ) -> DVector<f64>;
}

/// `½ · mean((x_iᵗ w − y_i)²)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl Objective for MeanSquaredError {
    fn loss(&self, x: &DMatrix<f64>, y: &DVector<f64>, w: &DVector<f64>, rows: &[usize]) -> f64 {
        mean_over_rows(x, w, rows, |i, z| {
            let r = z - y[i];
            0.5 * r * r
        })
    }

    fn gradient(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        w: &DVector<f64>,
        rows: &[usize],
    ) -> DVector<f64> {
        mean_gradient(x, w, rows, |i, z| z - y[i])
    }
}

/// Binary cross-entropy of `σ(x_iᵗ w)` against `y_i ∈ {0, 1}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl Objective for CrossEntropy {
    fn loss(&self, x: &DMatrix<f64>, y: &DVector<f64>, w: &DVector<f64>, rows: &[usize]) -> f64 {
        mean_over_rows(x, w, rows, |i, z| log_loss(sigmoid(z), y[i]))
    }

    fn gradient(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        w: &DVector<f64>,
        rows: &[usize],
    ) -> DVector<f64> {
        mean_gradient(x, w, rows, |i, z| sigmoid(z) - y[i])
    }
}

/// `mean_i f(i, x_iᵗ w)` over `rows`.
fn mean_over_rows<F>(x: &DMatrix<f64>, w: &DVector<f64>, rows: &[usize], f: F) -> f64
where
    F: Fn(usize, f64) -> f64 + Sync,
{
    if rows.is_empty() {
        return 0.0;
    }
    let partials: Vec<f64> = rows
        .par_chunks(CHUNK_ROWS)
        .map(|chunk| chunk.iter().map(|&i| f(i, row_dot(x, i, w))).sum::<f64>())
        .collect();
    partials.iter().sum::<f64>() / rows.len() as f64
}

/// `Σ residual(i, x_iᵗ w) · x_i / |rows|` over `rows`.
fn mean_gradient<F>(x: &DMatrix<f64>, w: &DVector<f64>, rows: &[usize], residual: F) -> DVector<f64>
where
    F: Fn(usize, f64) -> f64 + Sync,
{
    let p = x.ncols();
    if rows.is_empty() {
        return DVector::zeros(p);
    }
    let partials: Vec<DVector<f64>> = rows
        .par_chunks(CHUNK_ROWS)
        .map(|chunk| {
            let mut g = DVector::<f64>::zeros(p);
            for &i in chunk {
                let r = residual(i, row_dot(x, i, w));
                for (gj, xij) in g.iter_mut().zip(x.row(i).iter()) {
                    *gj += r * xij;
                }
            }
            g
        })
        .collect();

    let mut total = DVector::<f64>::zeros(p);
    for g in &partials {
        total += g;
    }
    total / rows.len() as f64
}
