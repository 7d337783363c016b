//! Objective values and dual-point construction.
//!
//! The solver's convergence certificate is the duality gap, the difference
//! between the primal objective at the current coefficients and the dual
//! objective at a feasible dual point. This module computes both objectives,
//! builds the unscaled dual candidate from the current fit, and projects a
//! candidate into the dual feasible set (bounded inner product with every
//! considered column).

use ndarray::{Array1, ArrayView1};

use crate::Float;
use crate::design::DesignMatrix;
use crate::types::Task;

/// Overflow-safe `log(1 + exp(x))`.
pub fn log1pexp<F: Float>(x: F) -> F {
    if x < F::cast(-18.0) {
        x.exp()
    } else if x > F::cast(18.0) {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// `1 / (1 + exp(-x))`.
pub fn sigmoid<F: Float>(x: F) -> F {
    F::one() / (F::one() + (-x).exp())
}

/// Negative binary entropy `x·log(x) + (1−x)·log(1−x)` on [0, 1], with the
/// `0·log(0) = 0` convention, and `+∞` outside the interval. The infinity
/// acts as a barrier in the logistic dual, never as a signal of failure.
pub fn negative_entropy<F: Float>(x: F) -> F {
    if x >= F::zero() && x <= F::one() {
        let eps = F::cast(1e-10);
        if x < eps || F::one() - x < eps {
            F::zero()
        } else {
            x * x.ln() + (F::one() - x) * (F::one() - x).ln()
        }
    } else {
        F::infinity()
    }
}

/// Primal objective at the full coefficient vector. `fit` is the residual
/// for the Lasso and the margin for logistic regression.
pub fn primal<F: Float>(
    task: Task,
    alpha: F,
    y: ArrayView1<F>,
    fit: ArrayView1<F>,
    w: ArrayView1<F>,
) -> F {
    let l1: F = w.iter().map(|&wj| wj.abs()).sum();
    match task {
        Task::Lasso => {
            let n = F::cast(y.len());
            fit.dot(&fit) / (F::cast(2.0) * n) + alpha * l1
        }
        Task::Logistic => {
            let loss: F = y
                .iter()
                .zip(fit.iter())
                .map(|(&yi, &margin)| log1pexp(-yi * margin))
                .sum();
            loss + alpha * l1
        }
    }
}

/// Dual objective at `theta`. Only a lower bound on the primal when `theta`
/// is feasible; see [`make_feasible`].
pub fn dual<F: Float>(task: Task, alpha: F, norm_y2: F, y: ArrayView1<F>, theta: ArrayView1<F>) -> F {
    match task {
        Task::Lasso => {
            let n = F::cast(y.len());
            let two = F::cast(2.0);
            let mut acc = F::zero();
            for (&yi, &ti) in y.iter().zip(theta.iter()) {
                let d = yi / (alpha * n) - ti;
                acc = acc - d * d;
            }
            acc * alpha * alpha * n / two + norm_y2 / (two * n)
        }
        Task::Logistic => {
            let mut acc = F::zero();
            for (&yi, &ti) in y.iter().zip(theta.iter()) {
                acc = acc - negative_entropy(alpha * yi * ti);
            }
            acc
        }
    }
}

/// Writes the unscaled dual candidate derived from the current fit into
/// `out`: `R / (alpha·n)` for the Lasso, `yᵢ·σ(−yᵢ·marginᵢ) / alpha` for
/// logistic regression.
pub fn dual_candidate<F: Float>(
    task: Task,
    alpha: F,
    y: ArrayView1<F>,
    fit: ArrayView1<F>,
    out: &mut Array1<F>,
) {
    match task {
        Task::Lasso => {
            let scale = alpha * F::cast(y.len());
            for (o, &r) in out.iter_mut().zip(fit.iter()) {
                *o = r / scale;
            }
        }
        Task::Logistic => {
            for ((o, &yi), &margin) in out.iter_mut().zip(y.iter()).zip(fit.iter()) {
                *o = yi * sigmoid(-yi * margin) / alpha;
            }
        }
    }
}

/// `max_j ⟨X_j, theta⟩` over columns not flagged in `skip`, signed under the
/// non-negativity constraint and absolute otherwise.
pub fn dual_norm<F: Float, D: DesignMatrix<F>>(
    design: &D,
    theta: ArrayView1<F>,
    skip: &[bool],
    positive: bool,
) -> F {
    let theta_sum = if design.is_centered() {
        theta.sum()
    } else {
        F::zero()
    };
    let mut scal = F::zero();
    for j in 0..design.n_features() {
        if skip[j] {
            continue;
        }
        let xj_theta = design.dot_col(j, theta, theta_sum);
        let value = if positive { xj_theta } else { xj_theta.abs() };
        if value > scal {
            scal = value;
        }
    }
    scal
}

/// Projects `theta` into the dual feasible set by dividing it by its dual
/// norm whenever that norm exceeds one, which guarantees the dual objective
/// at `theta` is a valid lower bound. Returns the norm that was found.
pub fn make_feasible<F: Float, D: DesignMatrix<F>>(
    design: &D,
    theta: &mut Array1<F>,
    skip: &[bool],
    positive: bool,
) -> F {
    let scal = dual_norm(design, theta.view(), skip, positive);
    if scal > F::one() {
        theta.mapv_inplace(|t| t / scal);
    }
    scal
}
