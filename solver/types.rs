use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Float;

/// The loss being minimized, on top of which the `alpha`-weighted L1 penalty
/// is always added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Squared loss `‖y − Xw‖² / (2·n_samples)`.
    Lasso,
    /// Logistic loss `Σᵢ log(1 + exp(−yᵢ⟨xᵢ, w⟩))` with targets in {−1, +1}.
    Logistic,
}

/// How an inner coordinate-descent call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubproblemStatus {
    /// The restricted duality gap fell below the inner tolerance.
    Converged,
    /// The epoch budget ran out first. Not fatal: the outer loop continues
    /// from whatever state the subproblem reached.
    EpochBudgetExhausted,
}

/// Tuning knobs for [`crate::solve`].
///
/// `tol` is an absolute duality-gap threshold; callers wanting the usual
/// estimator-level relative criterion scale it by `‖y‖²/n_samples`
/// themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveParams<F> {
    /// Outer iteration budget (number of working-set definitions).
    pub max_iter: usize,
    /// Epoch budget for each inner coordinate-descent call.
    pub max_epochs: usize,
    /// Number of epochs between duality-gap checks in the inner solver.
    pub gap_freq: usize,
    /// Target duality gap.
    pub tol: F,
    /// Working-set size on the first iteration.
    pub p0: usize,
    /// Rebuild the working set from the nonzero coefficients each iteration
    /// instead of forcing the previous set to be retained.
    pub prune: bool,
    /// Enable dual-point extrapolation in the inner solver.
    pub use_accel: bool,
    /// Constrain all coefficients to be non-negative.
    pub positive: bool,
    /// Refresh the per-feature logistic curvature estimates from the current
    /// margins at the start of each inner solve.
    pub better_lc: bool,
    /// Inner tolerance as a fraction of the current outer gap (only used
    /// when `prune` is on; otherwise the inner tolerance is `tol`).
    pub tol_ratio_inner: F,
}

impl<F: Float> Default for SolveParams<F> {
    fn default() -> Self {
        SolveParams {
            max_iter: 50,
            max_epochs: 50_000,
            gap_freq: 10,
            tol: F::cast(1e-6),
            p0: 10,
            prune: true,
            use_accel: true,
            positive: false,
            better_lc: true,
            tol_ratio_inner: F::cast(0.3),
        }
    }
}

/// Diagnostics returned by [`crate::solve`]. The coefficient, fit and dual
/// vectors themselves are mutated in place through the references the caller
/// passed in.
#[derive(Debug, Clone)]
pub struct SolveReport<F> {
    /// One `(primal objective, duality gap)` pair per outer iteration
    /// actually run; its length is the iteration count, not the budget.
    pub trace: Vec<(F, F)>,
}

impl<F: Float> SolveReport<F> {
    pub fn n_iter(&self) -> usize {
        self.trace.len()
    }

    /// Gap recorded on the last iteration that ran.
    pub fn final_gap(&self) -> F {
        self.trace.last().map_or(F::infinity(), |&(_, gap)| gap)
    }
}

/// Caller contract violations. Everything recoverable (a non-positive-definite
/// extrapolation system, an exhausted epoch or iteration budget) is reported
/// through logs and return values instead.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("regularization strength must be positive, got {0}")]
    InvalidRegularization(f64),

    #[error("{what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("logistic regression targets must be -1 or +1")]
    InvalidTargets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_reference_settings() {
        let params: SolveParams<f64> = SolveParams::default();
        assert_eq!(params.max_iter, 50);
        assert_eq!(params.max_epochs, 50_000);
        assert_eq!(params.gap_freq, 10);
        assert_eq!(params.p0, 10);
        assert!(params.prune);
        assert!(params.use_accel);
        assert!(!params.positive);
        assert_eq!(params.tol_ratio_inner, 0.3);
    }

    #[test]
    fn report_final_gap_is_last_entry() {
        let report = SolveReport {
            trace: vec![(10.0, 5.0), (8.0, 1.0), (7.5, 1e-8)],
        };
        assert_eq!(report.n_iter(), 3);
        assert_eq!(report.final_gap(), 1e-8);
    }

    #[test]
    fn empty_report_has_infinite_gap() {
        let report: SolveReport<f64> = SolveReport { trace: vec![] };
        assert!(report.final_gap().is_infinite());
    }
}
