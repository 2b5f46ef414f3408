//! Model evaluation for the two fitted experiments.
//!
//! The fitter relies on two primitive operations:
//! - predict `y(x)` given a parameter vector (for residuals)
//! - sample the fitted curve on a grid (for plot overlays)
//!
//! Both are implemented here per model kind; the fitter itself never
//! hardcodes a functional form.

use serde::{Deserialize, Serialize};

/// Concrete fit model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Cornell quark potential `V(r) = σ·r − b/r + c`.
    ///
    /// Superposition of a short-distance Coulomb profile and a linear
    /// long-distance one; the slope σ is the string tension.
    CornellPotential,
    /// Ground-state propagator decay `f(x) = exp(−x² − E₀·T)/√π`.
    GaussianDecay,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::CornellPotential => "V(r) = sigma*r - b/r + c",
            ModelKind::GaussianDecay => "f(x) = exp(-x^2 - E0*T)/sqrt(pi)",
        }
    }

    /// Parameter names in fit order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::CornellPotential => &["sigma", "b", "c"],
            ModelKind::GaussianDecay => &["E0", "T"],
        }
    }

    pub fn param_count(self) -> usize {
        self.param_names().len()
    }
}

/// Predict `y(x)` for the given model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_count()`. Callers size
/// the parameter vector from the model.
pub fn predict(model: ModelKind, x: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::CornellPotential => {
            // The Coulomb term diverges at r = 0; the reference macro pins
            // the value far below any plot range instead of propagating NaN.
            if x == 0.0 {
                return -1.0e8;
            }
            params[0] * x - params[1] / x + params[2]
        }
        ModelKind::GaussianDecay => {
            (-x * x - params[0] * params[1]).exp() / std::f64::consts::PI.sqrt()
        }
    }
}

/// Sample the model on `n` evenly spaced points over `[x0, x1]`.
pub fn sample_curve(model: ModelKind, params: &[f64], x0: f64, x1: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = x0 + u * (x1 - x0);
            (x, predict(model, x, params))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cornell_matches_hand_computation() {
        // V(2) = 5*2 - 5/2 + 0 = 7.5 with the reference initial guess.
        let v = predict(ModelKind::CornellPotential, 2.0, &[5.0, 5.0, 0.0]);
        assert!((v - 7.5).abs() < 1e-12);
    }

    #[test]
    fn cornell_guards_the_origin() {
        let v = predict(ModelKind::CornellPotential, 0.0, &[5.0, 5.0, 0.0]);
        assert!(v < -1.0e7);
    }

    #[test]
    fn gaussian_decay_at_origin_is_normalized_exponential() {
        // f(0) = exp(-E0*T)/sqrt(pi)
        let y = predict(ModelKind::GaussianDecay, 0.0, &[0.5, 4.0]);
        let expected = (-2.0_f64).exp() / std::f64::consts::PI.sqrt();
        assert!((y - expected).abs() < 1e-12);
    }

    #[test]
    fn sample_curve_covers_both_endpoints() {
        let pts = sample_curve(ModelKind::GaussianDecay, &[0.5, 2.0], -1.0, 1.0, 11);
        assert_eq!(pts.len(), 11);
        assert!((pts[0].0 + 1.0).abs() < 1e-12);
        assert!((pts[10].0 - 1.0).abs() < 1e-12);
    }
}
