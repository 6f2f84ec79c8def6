//! Dense matrix helpers shared by every estimator.
//!
//! Inputs arrive as `nalgebra` containers (or nested rows from a façade) and
//! are only ever borrowed. Anything that needs a modified design matrix (for
//! instance the bias column) works on a fresh copy.

use nalgebra::{DMatrix, DVector};

use crate::error::{EstimatorError, Result};

/// Build a matrix from row-major nested rows.
///
/// All rows must have the same length. An empty slice yields a `0 × 0` matrix.
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<DMatrix<f64>> {
    let n = rows.len();
    let p = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != p) {
        return Err(EstimatorError::dimension_mismatch(format!(
            "row {i} has {} columns, expected {p}",
            row.len()
        )));
    }
    Ok(DMatrix::from_fn(n, p, |i, j| rows[i][j]))
}

/// Append a trailing column of ones (intercept convention: last weight).
pub fn with_bias_column(x: &DMatrix<f64>) -> DMatrix<f64> {
    let p = x.ncols();
    x.clone().insert_column(p, 1.0)
}

/// Design matrix for a fit/predict call, optionally with the bias column.
pub fn design_matrix(x: &DMatrix<f64>, with_bias: bool) -> DMatrix<f64> {
    if with_bias {
        with_bias_column(x)
    } else {
        x.clone()
    }
}

/// Gram matrix `XᵗX`.
pub fn gram(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.tr_mul(x)
}

/// `Xᵗy`.
pub fn xt_y(x: &DMatrix<f64>, y: &DVector<f64>) -> DVector<f64> {
    x.tr_mul(y)
}

/// Dot product of row `i` of `x` with `w`, accumulated left to right.
pub fn row_dot(x: &DMatrix<f64>, i: usize, w: &DVector<f64>) -> f64 {
    x.row(i).iter().zip(w.iter()).map(|(a, b)| a * b).sum()
}

/// Squared Euclidean distance between row `i` of `a` and row `j` of `b`.
pub fn row_sq_distance(a: &DMatrix<f64>, i: usize, b: &DMatrix<f64>, j: usize) -> f64 {
    a.row(i)
        .iter()
        .zip(b.row(j).iter())
        .map(|(u, v)| {
            let d = u - v;
            d * d
        })
        .sum()
}

/// Reject design matrices without samples or features.
pub fn ensure_non_empty(x: &DMatrix<f64>) -> Result<()> {
    ensure_fit_shape(x, false)
}

/// Reject inputs with no samples, or with no parameters once the bias column
/// is counted. An `n × 0` input with a bias is an intercept-only fit.
pub fn ensure_fit_shape(x: &DMatrix<f64>, with_bias: bool) -> Result<()> {
    if x.nrows() == 0 || x.ncols() + usize::from(with_bias) == 0 {
        return Err(EstimatorError::dimension_mismatch(format!(
            "design matrix is {}x{} (bias={with_bias}), expected at least one sample and one parameter",
            x.nrows(),
            x.ncols()
        )));
    }
    Ok(())
}

/// `X.rows == y.len()`.
pub fn ensure_same_rows(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(EstimatorError::dimension_mismatch(format!(
            "X has {} rows but y has {} entries",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

pub fn ensure_finite<'a>(
    values: impl IntoIterator<Item = &'a f64>,
    what: &'static str,
) -> Result<()> {
    if values.into_iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EstimatorError::NonFiniteInput(what))
    }
}
