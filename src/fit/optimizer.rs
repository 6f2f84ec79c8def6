//! Mini-batch gradient descent.
//!
//! Per epoch:
//! - shuffle the sample indices with the seeded RNG
//! - split them into batches of `batch_size` (the last one may be smaller)
//! - for each batch, `w ← w − learning_rate · ∇loss(batch)`
//!
//! There is no early stopping. Divergence is not an error: the final weights
//! are returned as-is and the caller can inspect the per-epoch losses.

use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::GradientConfig;
use crate::error::{EstimatorError, Result};
use crate::fit::Objective;
use crate::math::{ensure_non_empty, ensure_same_rows};

/// Optimizer output.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Final weights (zeros-initialized, one per column of `x`).
    pub weights: DVector<f64>,
    /// Full-dataset loss after each epoch.
    pub losses: Vec<f64>,
}

/// Check hyperparameters before any iteration starts.
pub fn validate(config: &GradientConfig) -> Result<()> {
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(EstimatorError::invalid_config(format!(
            "learning_rate must be finite and > 0, got {}",
            config.learning_rate
        )));
    }
    if config.epochs == 0 {
        return Err(EstimatorError::invalid_config("epochs must be > 0"));
    }
    if config.batch_size == 0 {
        return Err(EstimatorError::invalid_config("batch_size must be > 0"));
    }
    Ok(())
}

/// Minimize `objective` over the rows of `x` / `y`.
pub fn optimize<O: Objective>(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    objective: &O,
    config: &GradientConfig,
) -> Result<Trajectory> {
    ensure_same_rows(x, y)?;
    ensure_non_empty(x)?;
    validate(config)?;

    let n = x.nrows();
    let mut rng = StdRng::seed_from_u64(config.random_state);
    let all: Vec<usize> = (0..n).collect();
    let mut order = all.clone();
    let mut weights = DVector::<f64>::zeros(x.ncols());
    let mut losses = Vec::with_capacity(config.epochs);

    debug!(
        "gradient descent: n={n} p={} lr={} epochs={} batch_size={}",
        x.ncols(),
        config.learning_rate,
        config.epochs,
        config.batch_size
    );

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        for batch in order.chunks(config.batch_size) {
            let grad = objective.gradient(x, y, &weights, batch);
            weights.axpy(-config.learning_rate, &grad, 1.0);
        }
        let loss = objective.loss(x, y, &weights, &all);
        trace!("epoch {epoch}: loss={loss}");
        losses.push(loss);
    }

    if weights.iter().any(|w| !w.is_finite()) {
        warn!(
            "gradient descent diverged to non-finite weights (lr={})",
            config.learning_rate
        );
    }

    Ok(Trajectory { weights, losses })
}
