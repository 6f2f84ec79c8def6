//! K-means clustering (Lloyd's algorithm).
//!
//! Phases of a fit:
//!
//! 1. **Initialize** `k` centroids from distinct sample rows (`random` or `kmeans++`).
//! 2. **Assign** every sample to its nearest centroid (squared Euclidean
//!    distance, ties to the lowest cluster index).
//! 3. **Update** every centroid to the mean of its samples.
//!
//! Steps 2–3 repeat until an assignment pass changes nothing (`Converged`) or
//! `max_iter` passes have run (`MaxIterReached`, not an error). The whole
//! procedure is restarted `n_init` times and the lowest-inertia run wins.
//!
//! Empty clusters are reseeded with the sample farthest from its nearest
//! centroid, so centroids never become NaN. The returned assignment always
//! matches the returned centroids.

use log::{debug, trace, warn};
use nalgebra::DMatrix;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{FitState, KMeansConfig, KMeansInit};
use crate::error::{EstimatorError, Result};
use crate::math::{ensure_finite, ensure_non_empty, row_sq_distance};

/// How a fit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Converged,
    MaxIterReached,
}

/// Fitted centroids plus diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansFit {
    /// `n_clusters × n_features`.
    pub centroids: DMatrix<f64>,
    /// Cluster index per sample, in `[0, n_clusters)`.
    pub assignment: Vec<usize>,
    /// Sum of squared distances from each sample to its centroid.
    pub inertia: f64,
    /// Assignment passes run.
    pub n_iter: usize,
    pub termination: Termination,
}

/// Cluster the rows of `x`.
///
/// Runs Lloyd's algorithm `n_init` times from independently seeded
/// initializations and keeps the run with the lowest inertia (earliest run on
/// ties).
pub fn fit(x: &DMatrix<f64>, config: &KMeansConfig) -> Result<KMeansFit> {
    ensure_non_empty(x)?;
    validate(config, x.nrows())?;
    ensure_finite(x.iter(), "X")?;

    debug!(
        "k-means: n={} p={} k={} init={} n_init={}",
        x.nrows(),
        x.ncols(),
        config.n_clusters,
        config.init,
        config.n_init
    );

    let mut seeds = StdRng::seed_from_u64(config.random_state);
    let mut best: Option<KMeansFit> = None;
    for run in 0..config.n_init {
        let mut rng = StdRng::seed_from_u64(seeds.r#gen());
        let out = lloyd(x, config, &mut rng)?;
        debug!(
            "k-means run {run}: {:?} after {} iterations, inertia={}",
            out.termination, out.n_iter, out.inertia
        );
        if best.as_ref().is_none_or(|b| out.inertia < b.inertia) {
            best = Some(out);
        }
    }
    best.ok_or_else(|| EstimatorError::invalid_config("n_init must be > 0"))
}

/// One initialization followed by assign/update passes.
fn lloyd(x: &DMatrix<f64>, config: &KMeansConfig, rng: &mut StdRng) -> Result<KMeansFit> {
    let mut centroids = match config.init {
        KMeansInit::Random => init_random(x, config.n_clusters, rng),
        KMeansInit::KMeansPlusPlus => init_plus_plus(x, config.n_clusters, rng)?,
    };

    let mut previous: Option<Vec<usize>> = None;
    let mut termination = Termination::MaxIterReached;
    let mut n_iter = 0;

    while n_iter < config.max_iter {
        n_iter += 1;
        let (labels, dists) = assign(x, &centroids);
        if previous.as_ref() == Some(&labels) {
            trace!("k-means iteration {n_iter}: assignment stable");
            termination = Termination::Converged;
            break;
        }
        update(x, &labels, &dists, &mut centroids);
        trace!(
            "k-means iteration {n_iter}: inertia before update={}",
            dists.iter().sum::<f64>()
        );
        previous = Some(labels);
    }

    // Report the assignment against the final centroids (the last update may
    // have moved them when `max_iter` was hit).
    let (assignment, dists) = assign(x, &centroids);
    let inertia = dists.iter().sum();

    Ok(KMeansFit {
        centroids,
        assignment,
        inertia,
        n_iter,
        termination,
    })
}

/// Nearest-centroid label for each row of `x`.
pub fn predict(x: &DMatrix<f64>, centroids: &DMatrix<f64>) -> Result<Vec<usize>> {
    if centroids.nrows() == 0 {
        return Err(EstimatorError::dimension_mismatch("no centroids"));
    }
    if x.ncols() != centroids.ncols() {
        return Err(EstimatorError::dimension_mismatch(format!(
            "X has {} features but centroids have {}",
            x.ncols(),
            centroids.ncols()
        )));
    }
    ensure_finite(x.iter(), "X")?;
    Ok(assign(x, centroids).0)
}

fn validate(config: &KMeansConfig, n_samples: usize) -> Result<()> {
    if config.n_clusters == 0 {
        return Err(EstimatorError::invalid_config("n_clusters must be > 0"));
    }
    if config.n_clusters > n_samples {
        return Err(EstimatorError::invalid_config(format!(
            "n_clusters ({}) exceeds n_samples ({n_samples})",
            config.n_clusters
        )));
    }
    if config.max_iter == 0 {
        return Err(EstimatorError::invalid_config("max_iter must be > 0"));
    }
    if config.n_init == 0 {
        return Err(EstimatorError::invalid_config("n_init must be > 0"));
    }
    Ok(())
}

fn rows_of(x: &DMatrix<f64>, rows: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), x.ncols(), |i, j| x[(rows[i], j)])
}

/// `k` distinct rows chosen uniformly.
fn init_random(x: &DMatrix<f64>, k: usize, rng: &mut StdRng) -> DMatrix<f64> {
    let picked = index::sample(rng, x.nrows(), k).into_vec();
    rows_of(x, &picked)
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance to the nearest chosen centroid.
fn init_plus_plus(x: &DMatrix<f64>, k: usize, rng: &mut StdRng) -> Result<DMatrix<f64>> {
    let n = x.nrows();
    let mut picked = Vec::with_capacity(k);
    let mut chosen = vec![false; n];

    let first = rng.gen_range(0..n);
    picked.push(first);
    chosen[first] = true;
    let mut nearest: Vec<f64> = (0..n).map(|i| row_sq_distance(x, i, x, first)).collect();

    while picked.len() < k {
        let next = if nearest.iter().any(|&d| d > 0.0) {
            let dist = WeightedIndex::new(&nearest).map_err(|e| {
                EstimatorError::invalid_config(format!("k-means++ weights: {e}"))
            })?;
            dist.sample(rng)
        } else {
            // Every remaining sample coincides with a chosen one.
            let remaining: Vec<usize> = (0..n).filter(|&i| !chosen[i]).collect();
            remaining[rng.gen_range(0..remaining.len())]
        };
        picked.push(next);
        chosen[next] = true;
        for (i, d) in nearest.iter_mut().enumerate() {
            *d = d.min(row_sq_distance(x, i, x, next));
        }
    }
    Ok(rows_of(x, &picked))
}

/// Labels and squared distances to the nearest centroid.
fn assign(x: &DMatrix<f64>, centroids: &DMatrix<f64>) -> (Vec<usize>, Vec<f64>) {
    (0..x.nrows())
        .into_par_iter()
        .map(|i| {
            let mut best = 0;
            let mut best_d = row_sq_distance(x, i, centroids, 0);
            for c in 1..centroids.nrows() {
                let d = row_sq_distance(x, i, centroids, c);
                if d < best_d {
                    best = c;
                    best_d = d;
                }
            }
            (best, best_d)
        })
        .unzip()
}

/// Move each centroid to the mean of its samples; reseed empty clusters.
fn update(x: &DMatrix<f64>, labels: &[usize], dists: &[f64], centroids: &mut DMatrix<f64>) {
    let k = centroids.nrows();
    let mut sums = DMatrix::<f64>::zeros(k, x.ncols());
    let mut counts = vec![0usize; k];
    for (i, &c) in labels.iter().enumerate() {
        counts[c] += 1;
        for (s, v) in sums.row_mut(c).iter_mut().zip(x.row(i).iter()) {
            *s += v;
        }
    }

    let mut used = vec![false; x.nrows()];
    for c in 0..k {
        if counts[c] > 0 {
            let mean = sums.row(c) / counts[c] as f64;
            centroids.set_row(c, &mean);
            continue;
        }
        // Farthest unused sample; lowest index wins ties.
        let mut far: Option<usize> = None;
        for (i, &d) in dists.iter().enumerate() {
            if used[i] {
                continue;
            }
            if far.is_none_or(|f| d > dists[f]) {
                far = Some(i);
            }
        }
        if let Some(i) = far {
            warn!("k-means: cluster {c} is empty, reseeding from sample {i}");
            used[i] = true;
            centroids.set_row(c, &x.row(i));
        }
    }
}

/// Where a model's centroids came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Centroids {
    /// Produced by `fit`, with its diagnostics.
    Trained(KMeansFit),
    /// Installed through `set_centroids`.
    Installed(DMatrix<f64>),
}

/// K-means model owning its configuration and fitted centroids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KMeans {
    config: KMeansConfig,
    centroids: Option<Centroids>,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self {
            config,
            centroids: None,
        }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    pub fn state(&self) -> FitState {
        if self.centroids.is_some() {
            FitState::Fitted
        } else {
            FitState::Unfitted
        }
    }

    pub fn fit(&mut self, x: &DMatrix<f64>) -> Result<&mut Self> {
        self.centroids = Some(Centroids::Trained(fit(x, &self.config)?));
        Ok(self)
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<usize>> {
        let centroids = self.centroids().ok_or(EstimatorError::NotFitted)?;
        predict(x, centroids)
    }

    pub fn centroids(&self) -> Option<&DMatrix<f64>> {
        self.centroids.as_ref().map(|c| match c {
            Centroids::Trained(fit) => &fit.centroids,
            Centroids::Installed(centroids) => centroids,
        })
    }

    /// Install centroids directly. Training diagnostics from a previous fit are dropped.
    pub fn set_centroids(&mut self, centroids: DMatrix<f64>) -> &mut Self {
        self.centroids = Some(Centroids::Installed(centroids));
        self
    }

    /// Assignment and diagnostics of the last `fit`, if any.
    pub fn last_fit(&self) -> Option<&KMeansFit> {
        match self.centroids.as_ref()? {
            Centroids::Trained(fit) => Some(fit),
            Centroids::Installed(_) => None,
        }
    }
}
