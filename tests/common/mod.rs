//! Shared fixtures for the integration tests: synthetic problem generators,
//! a CSC conversion helper, and deliberately naive full coordinate descent
//! references (no working sets, no screening, no extrapolation) to check the
//! fast solver against.

#![allow(dead_code)]

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Gaussian design with a sparse ground truth and additive noise.
pub fn make_regression(
    seed: u64,
    n_samples: usize,
    n_features: usize,
    nnz: usize,
    noise: f64,
) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::<f64>::zeros((n_samples, n_features));
    for v in x.iter_mut() {
        *v = rng.sample(StandardNormal);
    }
    let mut w_true = Array1::<f64>::zeros(n_features);
    for j in 0..nnz.min(n_features) {
        w_true[j] = rng.gen_range(0.5..2.0) * if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
    }
    let mut y = x.dot(&w_true);
    for v in y.iter_mut() {
        let e: f64 = rng.sample(StandardNormal);
        *v += noise * e;
    }
    (x, y)
}

/// Classification variant: targets are the sign of a noisy linear model.
pub fn make_classification(
    seed: u64,
    n_samples: usize,
    n_features: usize,
    nnz: usize,
) -> (Array2<f64>, Array1<f64>) {
    let (x, scores) = make_regression(seed, n_samples, n_features, nnz, 0.5);
    let y = scores.mapv(|s| if s >= 0.0 { 1.0 } else { -1.0 });
    (x, y)
}

/// Exact CSC decomposition of a dense matrix (zeros are dropped).
pub fn dense_to_csc(x: &Array2<f64>) -> (Vec<f64>, Vec<usize>, Vec<usize>) {
    let mut data = Vec::new();
    let mut indices = Vec::new();
    let mut indptr = vec![0usize];
    for j in 0..x.ncols() {
        for i in 0..x.nrows() {
            if x[[i, j]] != 0.0 {
                data.push(x[[i, j]]);
                indices.push(i);
            }
        }
        indptr.push(data.len());
    }
    (data, indices, indptr)
}

fn soft_threshold(x: f64, level: f64) -> f64 {
    x.signum() * (x.abs() - level).max(0.0)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Full cyclic coordinate descent for the Lasso, run until the largest
/// coordinate move stalls.
pub fn reference_lasso(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
    positive: bool,
) -> Array1<f64> {
    let n = y.len() as f64;
    let p = x.ncols();
    let lc: Vec<f64> = (0..p)
        .map(|j| {
            let col = x.column(j);
            col.dot(&col)
        })
        .collect();
    let mut w = Array1::<f64>::zeros(p);
    let mut r = y.clone();
    for _ in 0..200_000 {
        let mut max_move = 0.0f64;
        for j in 0..p {
            if lc[j] == 0.0 {
                continue;
            }
            let old = w[j];
            let mut new = soft_threshold(old + x.column(j).dot(&r) / lc[j], alpha * n / lc[j]);
            if positive && new < 0.0 {
                new = 0.0;
            }
            if new != old {
                r.scaled_add(old - new, &x.column(j));
                w[j] = new;
                max_move = max_move.max((new - old).abs());
            }
        }
        if max_move < 1e-13 {
            break;
        }
    }
    w
}

/// Full cyclic proximal coordinate descent for sparse logistic regression.
pub fn reference_logreg(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Array1<f64> {
    let p = x.ncols();
    let lc: Vec<f64> = (0..p)
        .map(|j| {
            let col = x.column(j);
            col.dot(&col) / 4.0
        })
        .collect();
    let mut w = Array1::<f64>::zeros(p);
    let mut xw = Array1::<f64>::zeros(y.len());
    for _ in 0..200_000 {
        let mut max_move = 0.0f64;
        for j in 0..p {
            if lc[j] == 0.0 {
                continue;
            }
            let old = w[j];
            let grad: f64 = x
                .column(j)
                .iter()
                .zip(y.iter().zip(xw.iter()))
                .map(|(&xij, (&yi, &m))| xij * yi * sigmoid(-yi * m))
                .sum();
            let new = soft_threshold(old + grad / lc[j], alpha / lc[j]);
            if new != old {
                xw.scaled_add(new - old, &x.column(j));
                w[j] = new;
                max_move = max_move.max((new - old).abs());
            }
        }
        if max_move < 1e-13 {
            break;
        }
    }
    w
}

/// Lasso primal objective.
pub fn lasso_primal(x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, alpha: f64) -> f64 {
    let r = y - &x.dot(w);
    r.dot(&r) / (2.0 * y.len() as f64) + alpha * w.iter().map(|v| v.abs()).sum::<f64>()
}

/// Logistic primal objective.
pub fn logreg_primal(x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, alpha: f64) -> f64 {
    let xw = x.dot(w);
    let loss: f64 = y
        .iter()
        .zip(xw.iter())
        .map(|(&yi, &m)| (1.0 + (-yi * m).exp()).ln())
        .sum();
    loss + alpha * w.iter().map(|v| v.abs()).sum::<f64>()
}
