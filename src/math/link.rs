//! Stable logistic link and binary cross-entropy.
//!
//! Numerical notes:
//! - `1 / (1 + exp(-z))` overflows `exp` for very negative `z`. We branch on the
//!   sign of `z` so that `exp` is only ever evaluated at a non-positive argument.
//! - `log(p)` is undefined at `p = 0`; probabilities are clamped to
//!   `[PROB_EPS, 1 - PROB_EPS]` before taking logs.

/// Clamp for probabilities entering `log`.
pub const PROB_EPS: f64 = 1e-15;

/// Logistic sigmoid `σ(z) = 1 / (1 + e^(−z))`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Cross-entropy of a single prediction `p` against a `{0, 1}` target.
pub fn log_loss(p: f64, y: f64) -> f64 {
    let p = p.clamp(PROB_EPS, 1.0 - PROB_EPS);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}
