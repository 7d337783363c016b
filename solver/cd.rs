//! Inner coordinate descent over a fixed working set.
//!
//! The subproblem solver owns the coefficient and fit vectors for the
//! duration of one call and sweeps the working set with closed-form
//! single-coordinate updates: soft-thresholding for the Lasso, one
//! proximal-Newton step for logistic regression. Every `gap_freq` epochs it
//! refreshes a local dual point (optionally improved by extrapolation),
//! checks the restricted duality gap, and exits early once the inner
//! tolerance is met. Running out of epochs is reported, not fatal.

use ndarray::{Array1, ArrayView1};

use crate::Float;
use crate::accel::{FitHistory, K};
use crate::design::DesignMatrix;
use crate::objective::{self, sigmoid};
use crate::types::{SolveParams, SubproblemStatus, Task};

/// Proximal operator of the L1 penalty: shrinks `x` toward zero by `level`.
pub fn soft_threshold<F: Float>(x: F, level: F) -> F {
    x.signum() * (x.abs() - level).max(F::zero())
}

/// Runs coordinate descent restricted to `ws` until the subproblem gap
/// falls below `tol` or `params.max_epochs` is exhausted. `w`, `fit` and
/// `theta` are mutated in place; `theta` ends at the best dual point the
/// subproblem found. Returns that point's dual objective and how the call
/// ended.
#[allow(clippy::too_many_arguments)]
pub fn solve_subproblem<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    task: Task,
    alpha: F,
    w: &mut Array1<F>,
    fit: &mut Array1<F>,
    theta: &mut Array1<F>,
    ws: &[usize],
    norms: ArrayView1<F>,
    lc: &mut Array1<F>,
    norm_y2: F,
    tol: F,
    params: &SolveParams<F>,
) -> (F, SubproblemStatus) {
    let n_samples = y.len();
    let n = F::cast(n_samples);

    let mut outside_ws = vec![true; design.n_features()];
    for &j in ws {
        outside_ws[j] = false;
    }

    if task == Task::Logistic && params.better_lc {
        let wts: Array1<F> = fit.mapv(|margin| {
            let s = sigmoid(margin);
            s * (F::one() - s)
        });
        let wts_sum = if design.is_centered() {
            wts.sum()
        } else {
            F::zero()
        };
        for &j in ws {
            lc[j] = design.weighted_sq_norm_col(j, wts.view(), wts_sum);
        }
    }

    let mut history = FitHistory::<F>::new(K);
    let mut theta_accel = Array1::<F>::zeros(n_samples);
    let mut highest_d_obj = F::zero();

    for epoch in 0..params.max_epochs {
        if epoch != 0 && epoch % params.gap_freq == 0 {
            objective::dual_candidate(task, alpha, y, fit.view(), theta);
            objective::make_feasible(design, theta, &outside_ws, params.positive);
            let mut d_obj = objective::dual(task, alpha, norm_y2, y, theta.view());

            if params.use_accel {
                history.push(fit.view());
                if let Some(fit_accel) = history.extrapolate() {
                    objective::dual_candidate(task, alpha, y, fit_accel.view(), &mut theta_accel);
                    objective::make_feasible(design, &mut theta_accel, &outside_ws, params.positive);
                    let d_obj_accel =
                        objective::dual(task, alpha, norm_y2, y, theta_accel.view());
                    if d_obj_accel > d_obj {
                        d_obj = d_obj_accel;
                        theta.assign(&theta_accel);
                    }
                }
            }

            if d_obj > highest_d_obj {
                highest_d_obj = d_obj;
            }
            let p_obj = objective::primal(task, alpha, y, fit.view(), w.view());
            let gap = p_obj - highest_d_obj;
            log::debug!("epoch {}: primal {:.10}, gap {:.2e}", epoch, p_obj, gap);
            if gap < tol {
                log::debug!(
                    "subproblem early exit at epoch {}, gap {:.2e} < {:.2e}",
                    epoch,
                    gap,
                    tol
                );
                return (highest_d_obj, SubproblemStatus::Converged);
            }
        }

        for &j in ws {
            if norms[j] == F::zero() {
                continue;
            }
            let old_w_j = w[j];
            match task {
                Task::Lasso => {
                    let fit_sum = if design.is_centered() {
                        fit.sum()
                    } else {
                        F::zero()
                    };
                    let xj_residual = design.dot_col(j, fit.view(), fit_sum);
                    w[j] = soft_threshold(old_w_j + xj_residual / lc[j], alpha * n / lc[j]);
                    if params.positive && w[j] < F::zero() {
                        w[j] = F::zero();
                    }
                    let diff = w[j] - old_w_j;
                    if diff != F::zero() {
                        design.axpy_col(j, -diff, fit);
                    }
                }
                Task::Logistic => {
                    let grad_sum = if design.is_centered() {
                        y.iter()
                            .zip(fit.iter())
                            .map(|(&yi, &margin)| yi * sigmoid(-yi * margin))
                            .sum()
                    } else {
                        F::zero()
                    };
                    let xj_grad =
                        design.dot_col_with(j, |i| y[i] * sigmoid(-y[i] * fit[i]), grad_sum);
                    w[j] = soft_threshold(old_w_j + xj_grad / lc[j], alpha / lc[j]);
                    if params.positive && w[j] < F::zero() {
                        w[j] = F::zero();
                    }
                    let diff = w[j] - old_w_j;
                    if diff != F::zero() {
                        design.axpy_col(j, diff, fit);
                    }
                }
            }
        }
    }

    log::warn!(
        "inner solver exhausted {} epochs without reaching tolerance {:.2e}",
        params.max_epochs,
        tol
    );
    (highest_d_obj, SubproblemStatus::EpochBudgetExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn soft_threshold_shrinks_toward_zero() {
        assert_eq!(soft_threshold(3.0f64, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0f64, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5f64, 1.0), 0.0);
        assert_eq!(soft_threshold(-0.5f64, 1.0), 0.0);
        assert_eq!(soft_threshold(0.0f64, 1.0), 0.0);
    }

    #[test]
    fn single_feature_lasso_reaches_closed_form() {
        // One feature: the optimum is ST(<x, y>/||x||^2, alpha n/||x||^2).
        let x = array![[1.0], [2.0], [-1.0], [0.5]];
        let y = array![2.0, 4.1, -1.9, 1.0];
        let alpha = 0.1;
        let norms = x.column_norms();
        let norm_sq = norms[0] * norms[0];
        let expected = soft_threshold(x.column(0).dot(&y) / norm_sq, alpha * 4.0 / norm_sq);

        let mut w = array![0.0];
        let mut fit = y.clone();
        let mut theta = Array1::zeros(4);
        let mut lc = array![norm_sq];
        let params = SolveParams::<f64>::default();
        let (_, status) = solve_subproblem(
            &x,
            y.view(),
            Task::Lasso,
            alpha,
            &mut w,
            &mut fit,
            &mut theta,
            &[0],
            norms.view(),
            &mut lc,
            y.dot(&y),
            1e-12,
            &params,
        );
        assert_eq!(status, SubproblemStatus::Converged);
        assert_abs_diff_eq!(w[0], expected, epsilon = 1e-10);
        assert_abs_diff_eq!(fit, &y - &(&x.column(0) * w[0]), epsilon = 1e-10);
    }

    #[test]
    fn epoch_budget_exhaustion_is_reported() {
        let x = array![[1.0, 0.3], [0.3, 1.0], [0.5, -0.5]];
        let y = array![1.0, 2.0, -0.5];
        let norms = x.column_norms();
        let mut lc = norms.mapv(|v: f64| v * v);
        let mut w = array![0.0, 0.0];
        let mut fit = y.clone();
        let mut theta = Array1::zeros(3);
        let params = SolveParams {
            max_epochs: 3,
            ..SolveParams::default()
        };
        let (_, status) = solve_subproblem(
            &x,
            y.view(),
            Task::Lasso,
            1e-3,
            &mut w,
            &mut fit,
            &mut theta,
            &[0, 1],
            norms.view(),
            &mut lc,
            y.dot(&y),
            1e-14,
            &params,
        );
        assert_eq!(status, SubproblemStatus::EpochBudgetExhausted);
    }
}
