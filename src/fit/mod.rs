//! First-order optimization.
//!
//! Responsibilities:
//!
//! - define the `Objective` seam (loss + gradient over a batch of rows)
//! - provide the two objectives used by the models (MSE, cross-entropy)
//! - run seeded mini-batch gradient descent over any objective

pub mod objective;
pub mod optimizer;

pub use objective::*;
pub use optimizer::*;
