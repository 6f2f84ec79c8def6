//! Linear algebra kernel and least squares.

pub mod decomp;
pub mod dense;
pub mod link;
pub mod lstsq;

pub use dense::*;
pub use link::*;
pub use lstsq::{solve, solve_with_config};
