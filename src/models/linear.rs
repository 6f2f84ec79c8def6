//! Linear regression model.

use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::{FitState, LinearConfig};
use crate::error::{EstimatorError, Result};
use crate::math::{design_matrix, ensure_finite, lstsq};

/// Least-squares linear regression.
///
/// Weights have one entry per feature, plus a trailing intercept when
/// `config.with_bias` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    config: LinearConfig,
    weights: Option<DVector<f64>>,
}

impl LinearRegression {
    pub fn new(config: LinearConfig) -> Self {
        Self {
            config,
            weights: None,
        }
    }

    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    pub fn state(&self) -> FitState {
        if self.weights.is_some() {
            FitState::Fitted
        } else {
            FitState::Unfitted
        }
    }

    /// Fit on `x` / `y`, replacing any previous weights.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<&mut Self> {
        let weights = lstsq::solve_with_config(x, y, &self.config)?;
        debug!("linear regression fitted: weights={}", weights.len());
        self.weights = Some(weights);
        Ok(self)
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let weights = self.weights.as_ref().ok_or(EstimatorError::NotFitted)?;
        predict(x, weights, self.config.with_bias)
    }

    pub fn weights(&self) -> Option<&DVector<f64>> {
        self.weights.as_ref()
    }

    /// Install weights directly (e.g. restored from storage).
    pub fn set_weights(&mut self, weights: DVector<f64>) -> &mut Self {
        self.weights = Some(weights);
        self
    }
}

/// `X w`, with the bias column appended first when `with_bias`.
pub fn predict(x: &DMatrix<f64>, weights: &DVector<f64>, with_bias: bool) -> Result<DVector<f64>> {
    let expected = x.ncols() + usize::from(with_bias);
    if weights.len() != expected {
        return Err(EstimatorError::dimension_mismatch(format!(
            "X has {} features (bias={with_bias}) but there are {} weights",
            x.ncols(),
            weights.len()
        )));
    }
    ensure_finite(x.iter(), "X")?;
    Ok(design_matrix(x, with_bias) * weights)
}
