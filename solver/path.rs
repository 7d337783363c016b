//! Regularization paths.
//!
//! Solving a decreasing grid of regularization strengths is the usual way
//! these models are fit in practice: each solution warm-starts the next,
//! and the first working-set size adapts to the support of the warm start.
//! The grid conventionally runs geometrically from `alpha_max` (the smallest
//! strength whose solution is the zero vector) down to a fraction of it.

use ndarray::{Array1, Array2, ArrayView1};

use crate::Float;
use crate::design::{DesignMatrix, compute_fit};
use crate::driver::solve;
use crate::objective;
use crate::types::{SolveParams, SolverError, Task};

/// Smallest regularization strength for which the all-zero coefficient
/// vector is optimal.
pub fn alpha_max<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    task: Task,
    positive: bool,
) -> F {
    let skip = vec![false; design.n_features()];
    let scal = objective::dual_norm(design, y, &skip, positive);
    match task {
        Task::Lasso => scal / F::cast(y.len()),
        Task::Logistic => scal / F::cast(2.0),
    }
}

/// Geometric grid of `n_alphas` strengths from `alpha_max` down to
/// `eps * alpha_max`.
pub fn alpha_grid<F: Float>(alpha_max: F, eps: F, n_alphas: usize) -> Vec<F> {
    if n_alphas <= 1 {
        return vec![alpha_max; n_alphas];
    }
    let ratio = eps.powf(F::one() / F::cast(n_alphas - 1));
    let mut grid = Vec::with_capacity(n_alphas);
    let mut alpha = alpha_max;
    for _ in 0..n_alphas {
        grid.push(alpha);
        alpha = alpha * ratio;
    }
    grid
}

/// First dual point for a cold start: the dual candidate normalized by its
/// dual norm, which makes it feasible from the outset.
pub fn initial_dual_point<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    task: Task,
    alpha: F,
    fit: ArrayView1<F>,
) -> Array1<F> {
    let mut theta = Array1::<F>::zeros(y.len());
    objective::dual_candidate(task, alpha, y, fit, &mut theta);
    let skip = vec![false; design.n_features()];
    let scal = objective::dual_norm(design, theta.view(), &skip, false);
    if scal > F::zero() {
        theta.mapv_inplace(|v| v / scal);
    }
    theta
}

/// Solutions along a regularization path.
#[derive(Debug, Clone)]
pub struct PathReport<F> {
    pub alphas: Vec<F>,
    /// Coefficients, one column per alpha.
    pub coefs: Array2<F>,
    /// Final duality gap reached at each alpha.
    pub gaps: Vec<F>,
}

/// Warm-started solve over a decreasing grid of regularization strengths.
/// An alpha whose final gap stays above `params.tol` is logged as a
/// convergence warning and the path continues.
pub fn solve_path<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    task: Task,
    alphas: &[F],
    params: &SolveParams<F>,
) -> Result<PathReport<F>, SolverError> {
    let n_features = design.n_features();
    let mut coefs = Array2::<F>::zeros((n_features, alphas.len()));
    let mut gaps = Vec::with_capacity(alphas.len());
    if alphas.is_empty() {
        return Ok(PathReport {
            alphas: Vec::new(),
            coefs,
            gaps,
        });
    }

    let norms = design.column_norms();
    let mut w = Array1::<F>::zeros(n_features);
    let mut fit = compute_fit(design, y, w.view(), task);
    let mut theta = initial_dual_point(design, y, task, alphas[0], fit.view());
    let mut params_t = params.clone();

    for (t, &alpha) in alphas.iter().enumerate() {
        if t > 0 {
            let nnz = w.iter().filter(|&&wj| wj != F::zero()).count();
            params_t.p0 = nnz.max(1);
        }
        let report = solve(
            design,
            y,
            task,
            alpha,
            &mut w,
            &mut fit,
            &mut theta,
            norms.view(),
            &params_t,
        )?;
        let gap = report.final_gap();
        if gap > params.tol {
            log::warn!(
                "alpha {}/{} did not converge: gap {:.2e} > {:.2e}; \
                 increasing the tolerance may speed the solver up without \
                 changing the results much",
                t + 1,
                alphas.len(),
                gap,
                params.tol
            );
        }
        coefs.column_mut(t).assign(&w);
        gaps.push(gap);
    }

    Ok(PathReport {
        alphas: alphas.to_vec(),
        coefs,
        gaps,
    })
}
