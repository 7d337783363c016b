//! Outer working-set driver.
//!
//! Each round refreshes the global dual point from the current fit, computes
//! the duality gap against the best dual objective seen so far, screens
//! features that provably cannot be active, grows a working set of the most
//! promising survivors, and delegates the restricted subproblem to the inner
//! coordinate-descent solver. The loop stops when the gap drops below the
//! tolerance or the iteration budget runs out; the latter is reported to the
//! caller through the gap trace, not as an error.

use ndarray::{Array1, ArrayView1};
use num_traits::ToPrimitive;

use crate::Float;
use crate::cd;
use crate::design::DesignMatrix;
use crate::objective;
use crate::screening;
use crate::types::{SolveParams, SolveReport, SolverError, Task};

/// Solves one L1-regularized problem at a fixed regularization strength.
///
/// `w` (coefficients), `fit` (residual for the Lasso, margin for logistic
/// regression) and `theta` (a dual-feasible point) are read as the starting
/// state and mutated in place; the caller guarantees `fit` is consistent
/// with `w` (see [`crate::compute_fit`]) and `norms` holds the precomputed
/// centered column norms (see [`DesignMatrix::column_norms`]).
#[allow(clippy::too_many_arguments)]
pub fn solve<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    task: Task,
    alpha: F,
    w: &mut Array1<F>,
    fit: &mut Array1<F>,
    theta: &mut Array1<F>,
    norms: ArrayView1<F>,
    params: &SolveParams<F>,
) -> Result<SolveReport<F>, SolverError> {
    validate(design, y, task, alpha, w, fit, theta, norms)?;

    let n_samples = design.n_samples();
    let n_features = design.n_features();
    let norm_y2 = y.dot(&y);

    let mut screened = vec![false; n_features];
    let mut n_screened = 0usize;
    let mut prios = Array1::<F>::zeros(n_features);
    let mut theta_inner = Array1::<F>::zeros(n_samples);
    let mut lc: Array1<F> = match task {
        Task::Lasso => norms.mapv(|v| v * v),
        Task::Logistic => norms.mapv(|v| v * v / F::cast(4.0)),
    };
    let mut ws: Vec<usize> = Vec::new();
    let mut trace: Vec<(F, F)> = Vec::with_capacity(params.max_iter);
    let mut highest_d_obj = F::zero();

    for t in 0..params.max_iter {
        // Refresh the global dual point, except on the first iteration where
        // the caller-supplied point is used as-is. The dual point left by
        // the previous inner solve competes with the fresh candidate; the
        // better certificate wins.
        let d_obj = if t == 0 {
            objective::dual(task, alpha, norm_y2, y, theta.view())
        } else {
            objective::dual_candidate(task, alpha, y, fit.view(), theta);
            objective::make_feasible(design, theta, &screened, params.positive);
            let mut d_obj = objective::dual(task, alpha, norm_y2, y, theta.view());

            objective::make_feasible(design, &mut theta_inner, &screened, params.positive);
            let d_obj_inner = objective::dual(task, alpha, norm_y2, y, theta_inner.view());
            if d_obj_inner > d_obj {
                d_obj = d_obj_inner;
                theta.assign(&theta_inner);
            }
            d_obj
        };

        // Dual objectives are not monotone across rounds; the gap is always
        // measured against the best one seen.
        if t == 0 || d_obj > highest_d_obj {
            highest_d_obj = d_obj;
        }

        let p_obj = objective::primal(task, alpha, y, fit.view(), w.view());
        let gap = p_obj - highest_d_obj;
        trace.push((p_obj, gap));
        log::info!("iter {}: primal {:.10}, gap {:.2e}", t, p_obj, gap);

        if gap < params.tol {
            log::info!(
                "early exit at iteration {}: gap {:.2e} < {:.2e}",
                t,
                gap,
                params.tol
            );
            break;
        }

        let radius = screening::safe_radius(task, gap, n_samples, alpha);
        n_screened = screening::screen_features(
            design,
            theta.view(),
            norms.view(),
            &mut prios,
            &mut screened,
            radius,
            n_screened,
            params.positive,
        );

        // Features with nonzero coefficients are always kept; without
        // pruning the previous working set's unscreened members stay too.
        let mut ws_size = if params.prune {
            let mut nnz = 0usize;
            for j in 0..n_features {
                if w[j] != F::zero() {
                    prios[j] = -F::one();
                    nnz += 1;
                }
            }
            if t == 0 {
                if nnz == 0 { params.p0 } else { nnz }
            } else {
                2 * nnz
            }
        } else {
            for j in 0..n_features {
                if w[j] != F::zero() {
                    prios[j] = -F::one();
                }
            }
            if t == 0 {
                params.p0
            } else {
                for &j in &ws {
                    if !screened[j] {
                        prios[j] = -F::one();
                    }
                }
                2 * ws.len()
            }
        };
        if ws_size > n_features - n_screened {
            ws_size = n_features - n_screened;
        }

        ws = if ws_size == n_features {
            (0..n_features).collect()
        } else {
            select_smallest(&prios, ws_size)
        };

        let tol_inner = if params.prune {
            params.tol_ratio_inner * gap
        } else {
            params.tol
        };
        log::info!(
            "{} features in subproblem ({} screened)",
            ws.len(),
            n_screened
        );

        cd::solve_subproblem(
            design,
            y,
            task,
            alpha,
            w,
            fit,
            &mut theta_inner,
            &ws,
            norms,
            &mut lc,
            norm_y2,
            tol_inner,
            params,
        );
    }

    Ok(SolveReport { trace })
}

/// Indices of the `count` smallest priorities, in ascending index order.
/// A partial selection, not a full sort.
fn select_smallest<F: Float>(prios: &Array1<F>, count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..prios.len()).collect();
    if count == 0 {
        return Vec::new();
    }
    if count < order.len() {
        order.select_nth_unstable_by(count - 1, |&a, &b| {
            prios[a]
                .partial_cmp(&prios[b])
                .expect("priorities must not be NaN")
        });
        order.truncate(count);
    }
    order.sort_unstable();
    order
}

#[allow(clippy::too_many_arguments)]
fn validate<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    task: Task,
    alpha: F,
    w: &Array1<F>,
    fit: &Array1<F>,
    theta: &Array1<F>,
    norms: ArrayView1<F>,
) -> Result<(), SolverError> {
    if !(alpha > F::zero()) {
        return Err(SolverError::InvalidRegularization(
            alpha.to_f64().unwrap_or(f64::NAN),
        ));
    }
    let n_samples = design.n_samples();
    let n_features = design.n_features();
    let checks = [
        ("target vector", n_samples, y.len()),
        ("fit vector", n_samples, fit.len()),
        ("dual point", n_samples, theta.len()),
        ("coefficient vector", n_features, w.len()),
        ("column norms", n_features, norms.len()),
    ];
    for (what, expected, actual) in checks {
        if expected != actual {
            return Err(SolverError::DimensionMismatch {
                what,
                expected,
                actual,
            });
        }
    }
    if task == Task::Logistic {
        let one = F::one();
        if y.iter().any(|&yi| yi != one && yi != -one) {
            return Err(SolverError::InvalidTargets);
        }
    }
    Ok(())
}
