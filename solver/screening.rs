//! Gap safe feature screening.
//!
//! Given a feasible dual point and the current duality gap, every feature
//! whose column is provably uncorrelated enough with any optimal dual point
//! can be discarded for the rest of the solve: its optimal coefficient must
//! be zero. The same pass computes a selection priority for every surviving
//! feature, which the outer driver uses to build the next working set
//! (smaller priority means more likely to be active).

use ndarray::{Array1, ArrayView1};

use crate::Float;
use crate::design::DesignMatrix;
use crate::types::Task;

/// Radius of the gap safe sphere around the current dual point.
pub fn safe_radius<F: Float>(task: Task, gap: F, n_samples: usize, alpha: F) -> F {
    let two = F::cast(2.0);
    match task {
        Task::Lasso => (two * gap / F::cast(n_samples)).sqrt() / alpha,
        Task::Logistic => (gap / two).sqrt() / alpha,
    }
}

/// Scores every feature and permanently screens those whose score exceeds
/// `radius`. Screened features (and zero-norm columns, which can never be
/// updated) receive an infinite priority so they are never selected into a
/// working set. Returns the updated screened count.
///
/// Screening is monotone: a feature marked here is never unmarked for the
/// rest of the solve call.
pub fn screen_features<F: Float, D: DesignMatrix<F>>(
    design: &D,
    theta: ArrayView1<F>,
    norms: ArrayView1<F>,
    prios: &mut Array1<F>,
    screened: &mut [bool],
    radius: F,
    n_screened: usize,
    positive: bool,
) -> usize {
    let mut n_screened = n_screened;
    let theta_sum = if design.is_centered() {
        theta.sum()
    } else {
        F::zero()
    };
    for j in 0..design.n_features() {
        if screened[j] || norms[j] == F::zero() {
            prios[j] = F::infinity();
            continue;
        }
        let xj_theta = design.dot_col(j, theta, theta_sum);
        prios[j] = if positive {
            (xj_theta - F::one()).abs() / norms[j]
        } else {
            (F::one() - xj_theta.abs()) / norms[j]
        };
        if prios[j] > radius {
            screened[j] = true;
            n_screened += 1;
        }
    }
    n_screened
}
