//! Configuration records and small shared enums.
//!
//! Every record here is captured before a fit starts and never mutated by the
//! fitting code. The `with_*` methods consume and return the record so that a
//! configuration reads as a single expression:
//!
//! ```
//! use binoculars::domain::{LinearConfig, LinearSolver};
//!
//! let config = LinearConfig::default()
//!     .with_solver(LinearSolver::Qr)
//!     .with_bias(true);
//! assert!(config.with_bias);
//! ```
//!
//! Range checks (positive epochs, learning rate, ...) are performed by the
//! component that consumes the record, right before any numeric work.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;

/// Lifecycle of a model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitState {
    Unfitted,
    Fitted,
}

/// Least-squares strategy for linear regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearSolver {
    /// Normal equations `XᵗX w = Xᵗy`, factored with Cholesky.
    Normal,
    /// Mini-batch gradient descent on the mean squared error.
    Gradient,
    /// Alias of `Normal`; shares the same code path.
    Cholesky,
    /// Householder QR of `X`.
    Qr,
    /// SVD pseudo-inverse (minimum-norm solution).
    Svd,
}

impl LinearSolver {
    pub fn name(self) -> &'static str {
        match self {
            LinearSolver::Normal => "normal",
            LinearSolver::Gradient => "gradient",
            LinearSolver::Cholesky => "cholesky",
            LinearSolver::Qr => "qr",
            LinearSolver::Svd => "svd",
        }
    }
}

impl FromStr for LinearSolver {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(LinearSolver::Normal),
            "gradient" => Ok(LinearSolver::Gradient),
            "cholesky" => Ok(LinearSolver::Cholesky),
            "qr" => Ok(LinearSolver::Qr),
            // `ls` is the historical name of the SVD least-squares path.
            "svd" | "ls" => Ok(LinearSolver::Svd),
            _ => Err(EstimatorError::UnsupportedSolver {
                solver: s.to_string(),
                model: "linear regression",
            }),
        }
    }
}

impl fmt::Display for LinearSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Training strategy for logistic regression. Only batched gradient descent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogisticSolver {
    #[default]
    Gd,
}

impl FromStr for LogisticSolver {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gd" => Ok(LogisticSolver::Gd),
            _ => Err(EstimatorError::UnsupportedSolver {
                solver: s.to_string(),
                model: "logistic regression",
            }),
        }
    }
}

impl fmt::Display for LogisticSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogisticSolver::Gd => f.write_str("gd"),
        }
    }
}

/// Centroid seeding strategy for k-means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KMeansInit {
    #[serde(rename = "random")]
    Random,
    #[default]
    #[serde(rename = "kmeans++")]
    KMeansPlusPlus,
}

impl FromStr for KMeansInit {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(KMeansInit::Random),
            "kmeans++" | "k-means++" => Ok(KMeansInit::KMeansPlusPlus),
            _ => Err(EstimatorError::UnsupportedSolver {
                solver: s.to_string(),
                model: "k-means",
            }),
        }
    }
}

impl fmt::Display for KMeansInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KMeansInit::Random => f.write_str("random"),
            KMeansInit::KMeansPlusPlus => f.write_str("kmeans++"),
        }
    }
}

/// Hyperparameters of the mini-batch gradient descent optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Step size, must be finite and `> 0`.
    pub learning_rate: f64,
    /// Number of full passes over the data, must be `> 0`.
    pub epochs: usize,
    /// Samples per update, must be `> 0`. The last batch of an epoch may be smaller.
    pub batch_size: usize,
    /// Seed for the per-epoch shuffle.
    pub random_state: u64,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 100,
            batch_size: 32,
            random_state: 0,
        }
    }
}

impl GradientConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }
}

/// Linear regression configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    pub solver: LinearSolver,
    /// Append a column of ones; the intercept becomes the last weight.
    pub with_bias: bool,
    /// Only consulted by `LinearSolver::Gradient`.
    pub gradient: GradientConfig,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            solver: LinearSolver::Normal,
            with_bias: false,
            gradient: GradientConfig::default(),
        }
    }
}

impl LinearConfig {
    pub fn with_solver(mut self, solver: LinearSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_bias(mut self, with_bias: bool) -> Self {
        self.with_bias = with_bias;
        self
    }

    pub fn with_gradient(mut self, gradient: GradientConfig) -> Self {
        self.gradient = gradient;
        self
    }
}

/// Logistic regression configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    pub solver: LogisticSolver,
    /// Append a column of ones; the intercept becomes the last weight.
    pub with_bias: bool,
    pub gradient: GradientConfig,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            solver: LogisticSolver::Gd,
            with_bias: false,
            gradient: GradientConfig::default(),
        }
    }
}

impl LogisticConfig {
    pub fn with_solver(mut self, solver: LogisticSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_bias(mut self, with_bias: bool) -> Self {
        self.with_bias = with_bias;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.gradient.learning_rate = learning_rate;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.gradient.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.gradient.batch_size = batch_size;
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.gradient.random_state = random_state;
        self
    }
}

/// K-means configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Must satisfy `0 < n_clusters <= n_samples`.
    pub n_clusters: usize,
    /// Upper bound on Lloyd iterations, must be `> 0`.
    pub max_iter: usize,
    pub init: KMeansInit,
    /// Independent restarts; the lowest-inertia run is kept. Must be `> 0`.
    pub n_init: usize,
    pub random_state: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            max_iter: 300,
            init: KMeansInit::KMeansPlusPlus,
            n_init: 10,
            random_state: 0,
        }
    }
}

impl KMeansConfig {
    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_init(mut self, init: KMeansInit) -> Self {
        self.init = init;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }
}
