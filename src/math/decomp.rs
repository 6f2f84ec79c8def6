//! Matrix decompositions and triangular solves.
//!
//! QR and SVD come from `nalgebra`; Cholesky is hand-rolled so that the pivot
//! tolerance is ours to control. Callers that must tolerate rank deficiency
//! use [`rank_cutoff`] and treat directions below it as contributing nothing.

use nalgebra::linalg::PermutationSequence;
use nalgebra::{DMatrix, DVector, Dyn};

use crate::error::{EstimatorError, Result};

/// Cholesky pivots at or below `PIVOT_TOL × max(1, max diag)` are rejected.
pub const PIVOT_TOL: f64 = 1e-12;

/// Singular values / `R` diagonals at or below `RANK_TOL × max` are treated as zero.
pub const RANK_TOL: f64 = 1e-10;

/// Column-pivoted thin QR of an `n × p` matrix: `x · P = q · r` with `q` of
/// shape `n × k`, `r` of shape `k × p`, `k = min(n, p)`.
///
/// Pivoting moves dependent columns to the end, so the leading diagonal of `r`
/// reveals the numerical rank.
#[derive(Debug, Clone)]
pub struct Qr {
    pub q: DMatrix<f64>,
    pub r: DMatrix<f64>,
    pub p: PermutationSequence<Dyn>,
}

impl Qr {
    /// Map coefficients of the pivoted columns back to the original column order.
    pub fn unpivot(&self, z: &mut DVector<f64>) {
        self.p.inv_permute_rows(z);
    }
}

/// Thin SVD factors: `x = u · diag(singular_values) · v_t`.
#[derive(Debug, Clone)]
pub struct Svd {
    pub u: DMatrix<f64>,
    pub singular_values: DVector<f64>,
    pub v_t: DMatrix<f64>,
}

/// Absolute cutoff below which a magnitude is treated as zero.
pub fn rank_cutoff(magnitudes: impl IntoIterator<Item = f64>) -> f64 {
    let max = magnitudes.into_iter().map(f64::abs).fold(0.0, f64::max);
    RANK_TOL * max
}

/// Lower-triangular `L` with `A = L Lᵗ` for a symmetric positive-definite `A`.
pub fn cholesky(a: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(EstimatorError::dimension_mismatch(format!(
            "cholesky needs a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }

    let max_diag = a.diagonal().iter().copied().fold(0.0, f64::max);
    let tol = PIVOT_TOL * max_diag.max(1.0);

    let mut l = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        let mut pivot = a[(j, j)];
        for k in 0..j {
            pivot -= l[(j, k)] * l[(j, k)];
        }
        if !(pivot > tol) {
            return Err(EstimatorError::NotPositiveDefinite { index: j, pivot });
        }
        let d = pivot.sqrt();
        l[(j, j)] = d;

        for i in (j + 1)..n {
            let mut s = a[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / d;
        }
    }
    Ok(l)
}

/// Solve `L x = b` for lower-triangular `L`.
pub fn solve_lower(l: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let n = check_triangular(l, b)?;
    let mut x = DVector::<f64>::zeros(n);
    for i in 0..n {
        let mut s = b[i];
        for j in 0..i {
            s -= l[(i, j)] * x[j];
        }
        x[i] = divide_pivot(s, l[(i, i)], i)?;
    }
    Ok(x)
}

/// Solve `U x = b` for upper-triangular `U`.
pub fn solve_upper(u: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let n = check_triangular(u, b)?;
    let mut x = DVector::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut s = b[i];
        for j in (i + 1)..n {
            s -= u[(i, j)] * x[j];
        }
        x[i] = divide_pivot(s, u[(i, i)], i)?;
    }
    Ok(x)
}

/// Back substitution on the leading full-rank block of an upper-trapezoidal
/// `r` (`k × p`, `k <= p`).
///
/// The rank is the number of leading diagonal entries above the rank cutoff.
/// Coefficients past it are zero, which gives a basic least-squares solution
/// when `r` comes from a column-pivoted QR.
pub fn solve_upper_truncated(r: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let (k, p) = r.shape();
    if b.len() != k || k > p {
        return Err(EstimatorError::dimension_mismatch(format!(
            "upper-trapezoidal solve got R {k}x{p} and b of length {}",
            b.len()
        )));
    }

    let cutoff = rank_cutoff(r.diagonal().iter().copied());
    let rank = (0..k).take_while(|&i| r[(i, i)].abs() > cutoff).count();
    let mut x = DVector::<f64>::zeros(p);
    for i in (0..rank).rev() {
        let mut s = b[i];
        for j in (i + 1)..rank {
            s -= r[(i, j)] * x[j];
        }
        x[i] = s / r[(i, i)];
    }
    Ok(x)
}

/// Householder QR of `x` with column pivoting.
pub fn qr(x: &DMatrix<f64>) -> Qr {
    let qr = x.clone().col_piv_qr();
    Qr {
        q: qr.q(),
        r: qr.r(),
        p: qr.p().clone(),
    }
}

/// Singular value decomposition of `x` (no rank assumption).
pub fn svd(x: &DMatrix<f64>) -> Result<Svd> {
    let svd = x
        .clone()
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or(EstimatorError::DecompositionFailed("svd did not converge"))?;
    let u = svd
        .u
        .ok_or(EstimatorError::DecompositionFailed("svd returned no left vectors"))?;
    let v_t = svd
        .v_t
        .ok_or(EstimatorError::DecompositionFailed("svd returned no right vectors"))?;
    Ok(Svd {
        u,
        singular_values: svd.singular_values,
        v_t,
    })
}

/// Minimum-norm solution of `x w ≈ b` via the SVD pseudo-inverse.
pub fn pinv_solve(svd: &Svd, b: &DVector<f64>) -> Result<DVector<f64>> {
    if svd.u.nrows() != b.len() {
        return Err(EstimatorError::dimension_mismatch(format!(
            "pseudo-inverse solve got U with {} rows and b of length {}",
            svd.u.nrows(),
            b.len()
        )));
    }
    let cutoff = rank_cutoff(svd.singular_values.iter().copied());
    let mut coeffs = svd.u.tr_mul(b);
    for (c, &s) in coeffs.iter_mut().zip(svd.singular_values.iter()) {
        *c = if s > cutoff { *c / s } else { 0.0 };
    }
    Ok(svd.v_t.tr_mul(&coeffs))
}

fn check_triangular(t: &DMatrix<f64>, b: &DVector<f64>) -> Result<usize> {
    let n = t.nrows();
    if t.ncols() != n || b.len() != n {
        return Err(EstimatorError::dimension_mismatch(format!(
            "triangular solve got {}x{} matrix and rhs of length {}",
            t.nrows(),
            t.ncols(),
            b.len()
        )));
    }
    Ok(n)
}

fn divide_pivot(s: f64, d: f64, i: usize) -> Result<f64> {
    if d == 0.0 {
        return Err(EstimatorError::SingularMatrix(format!(
            "zero pivot on row {i} of triangular system"
        )));
    }
    Ok(s / d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 3, &[4.0, 12.0, -16.0, 12.0, 37.0, -43.0, -16.0, -43.0, 98.0])
    }

    #[test]
    fn cholesky_known_factor() {
        let l = cholesky(&spd()).unwrap();
        let expected =
            DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 0.0, 6.0, 1.0, 0.0, -8.0, 5.0, 3.0]);
        assert!((l - expected).abs().max() < 1e-12);
    }

    #[test]
    fn cholesky_rejects_singular() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let err = cholesky(&a).unwrap_err();
        assert!(matches!(err, EstimatorError::NotPositiveDefinite { index: 1, .. }));
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let a = DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, 1.0]);
        assert!(matches!(
            cholesky(&a),
            Err(EstimatorError::NotPositiveDefinite { index: 0, .. })
        ));
    }

    #[test]
    fn triangular_solves_round_trip() {
        let a = spd();
        let l = cholesky(&a).unwrap();
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let z = solve_lower(&l, &b).unwrap();
        let x = solve_upper(&l.transpose(), &z).unwrap();
        assert!((&a * &x - &b).abs().max() < 1e-9);
    }

    #[test]
    fn qr_reconstructs_input() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let f = qr(&x);
        assert_eq!(f.q.shape(), (4, 2));
        assert_eq!(f.r.shape(), (2, 2));
        let mut pivoted = x.clone();
        f.p.permute_columns(&mut pivoted);
        assert!((&f.q * &f.r - &pivoted).abs().max() < 1e-12);
    }

    #[test]
    fn pivoting_moves_dependent_column_last() {
        // Columns [a, a, b]: the duplicate of `a` must end up past the rank.
        let x = DMatrix::from_row_slice(
            4,
            3,
            &[1.0, 1.0, 0.0, 2.0, 2.0, 1.0, 3.0, 3.0, 0.0, 4.0, 4.0, 1.0],
        );
        let f = qr(&x);
        let cutoff = rank_cutoff(f.r.diagonal().iter().copied());
        assert!(f.r[(0, 0)].abs() > cutoff);
        assert!(f.r[(1, 1)].abs() > cutoff);
        assert!(f.r[(2, 2)].abs() <= cutoff);
    }

    #[test]
    fn truncated_solve_stops_at_first_deficient_pivot() {
        let r = DMatrix::from_row_slice(2, 3, &[2.0, 1.0, 5.0, 0.0, 0.0, 7.0]);
        let b = DVector::from_row_slice(&[4.0, 1.0]);
        let x = solve_upper_truncated(&r, &b).unwrap();
        assert_eq!(x[1], 0.0);
        assert_eq!(x[2], 0.0);
        assert!((x[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn pinv_ignores_zero_singular_values() {
        // Two identical columns: minimum-norm solution splits the weight evenly.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0, 6.0]);
        let f = svd(&x).unwrap();
        let w = pinv_solve(&f, &y).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-9);
        assert!((w[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rank_cutoff_scales_with_largest() {
        assert_eq!(rank_cutoff([0.0, 0.0]), 0.0);
        assert!((rank_cutoff([-4.0, 2.0]) - 4e-10).abs() < 1e-24);
    }
}
