//! Domain types used throughout the estimators.
//!
//! This module defines:
//!
//! - solver / initialization enums (`LinearSolver`, `LogisticSolver`, `KMeansInit`)
//! - immutable configuration records (`LinearConfig`, `LogisticConfig`, `KMeansConfig`)
//! - the model lifecycle (`FitState`)

pub mod types;

pub use types::*;
