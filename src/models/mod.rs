//! Estimators.
//!
//! Each model module exposes the core as free functions over borrowed
//! matrices (`fit`, `predict`) plus an owning model type that keeps its
//! configuration and fitted parameters together.

pub mod kmeans;
pub mod linear;
pub mod logistic;

pub use kmeans::{KMeans, KMeansFit, Termination};
pub use linear::LinearRegression;
pub use logistic::LogisticRegression;
