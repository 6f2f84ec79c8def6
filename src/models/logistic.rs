//! Binary logistic regression trained with mini-batch gradient descent.
//!
//! `p(x) = σ(wᵗx)`, loss = mean binary cross-entropy, gradient `Xᵗ(p − y) / n`.
//! Targets must be exactly `0` or `1`.

use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::{FitState, LogisticConfig, LogisticSolver};
use crate::error::{EstimatorError, Result};
use crate::fit::{CrossEntropy, Trajectory, optimize, validate};
use crate::math::{design_matrix, ensure_finite, ensure_fit_shape, ensure_same_rows, sigmoid};

/// Train on `x` / `y` and return the weights together with the loss per epoch.
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, config: &LogisticConfig) -> Result<Trajectory> {
    ensure_same_rows(x, y)?;
    ensure_fit_shape(x, config.with_bias)?;
    validate(&config.gradient)?;
    ensure_finite(x.iter(), "X")?;
    validate_targets(y)?;

    let design = design_matrix(x, config.with_bias);
    let trajectory = match config.solver {
        LogisticSolver::Gd => optimize(&design, y, &CrossEntropy, &config.gradient)?,
    };
    debug!(
        "logistic regression fitted: epochs={} final_loss={:?}",
        trajectory.losses.len(),
        trajectory.losses.last()
    );
    Ok(trajectory)
}

/// Probabilities `σ(wᵗx)` for each row of `x`.
pub fn predict(x: &DMatrix<f64>, weights: &DVector<f64>, with_bias: bool) -> Result<DVector<f64>> {
    let margins = super::linear::predict(x, weights, with_bias)?;
    Ok(margins.map(sigmoid))
}

/// Threshold probabilities into `{0, 1}` labels (`p >= threshold` maps to 1).
pub fn classify(probabilities: &DVector<f64>, threshold: f64) -> DVector<f64> {
    probabilities.map(|p| if p >= threshold { 1.0 } else { 0.0 })
}

fn validate_targets(y: &DVector<f64>) -> Result<()> {
    match y.iter().position(|&v| v != 0.0 && v != 1.0) {
        Some(index) => Err(EstimatorError::InvalidTarget {
            index,
            value: y[index],
        }),
        None => Ok(()),
    }
}

/// Logistic regression model owning its configuration and fitted weights.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    weights: Option<DVector<f64>>,
    losses: Vec<f64>,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            weights: None,
            losses: Vec::new(),
        }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    pub fn state(&self) -> FitState {
        if self.weights.is_some() {
            FitState::Fitted
        } else {
            FitState::Unfitted
        }
    }

    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<&mut Self> {
        let Trajectory { weights, losses } = fit(x, y, &self.config)?;
        self.weights = Some(weights);
        self.losses = losses;
        Ok(self)
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let weights = self.weights.as_ref().ok_or(EstimatorError::NotFitted)?;
        predict(x, weights, self.config.with_bias)
    }

    pub fn weights(&self) -> Option<&DVector<f64>> {
        self.weights.as_ref()
    }

    /// Install weights directly. Clears the loss history of any previous fit.
    pub fn set_weights(&mut self, weights: DVector<f64>) -> &mut Self {
        self.weights = Some(weights);
        self.losses.clear();
        self
    }

    /// Full-dataset cross-entropy after each epoch of the last fit.
    pub fn losses(&self) -> &[f64] {
        &self.losses
    }
}
