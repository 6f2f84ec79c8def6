//! `binoculars` library crate.
//!
//! Native numerical core for three estimators:
//!
//! - linear regression via interchangeable least-squares solvers
//!   (normal equations / Cholesky, QR, SVD, gradient descent)
//! - binary logistic regression trained with mini-batch gradient descent
//! - k-means clustering (random or k-means++ seeding, Lloyd iterations)
//!
//! Matrices are `nalgebra` dense containers and are only borrowed during a
//! call. Fitted parameters are plain vectors / matrices owned by the caller or
//! by the model types in [`models`].

pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;

pub use error::{EstimatorError, Result};
