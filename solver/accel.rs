//! Dual-point extrapolation.
//!
//! The inner solver records a snapshot of the fit vector each time it checks
//! the duality gap. Once enough snapshots exist, an Anderson-style
//! combination of them usually lies much closer to the limit of the
//! coordinate-descent sequence than the latest iterate: the weights solve a
//! small Gram system built from consecutive snapshot differences. The
//! extrapolated fit is turned into a dual candidate by the caller and kept
//! only if it certifies a better dual objective.

use ndarray::{Array1, Array2, ArrayView1};
use ndarray_linalg::{Cholesky, Solve, UPLO};
use num_traits::NumCast;

use crate::Float;

/// Number of fitted-value snapshots kept for extrapolation.
pub const K: usize = 6;

/// Fixed-capacity ring of the most recent fit snapshots, oldest evicted
/// first. One instance lives per inner solve; it starts empty.
pub struct FitHistory<F: Float> {
    snaps: Vec<Array1<F>>,
    head: usize,
    cap: usize,
}

impl<F: Float> FitHistory<F> {
    pub fn new(cap: usize) -> Self {
        assert!(cap >= 2, "extrapolation needs at least two snapshots");
        FitHistory {
            snaps: Vec::with_capacity(cap),
            head: 0,
            cap,
        }
    }

    pub fn push(&mut self, fit: ArrayView1<F>) {
        if self.snaps.len() < self.cap {
            self.snaps.push(fit.to_owned());
        } else {
            self.snaps[self.head].assign(&fit);
            self.head = (self.head + 1) % self.cap;
        }
    }

    pub fn is_full(&self) -> bool {
        self.snaps.len() == self.cap
    }

    /// Snapshot `k` in chronological order, 0 being the oldest retained.
    fn snapshot(&self, k: usize) -> &Array1<F> {
        &self.snaps[(self.head + k) % self.snaps.len()]
    }

    /// Extrapolated fit vector, or `None` while the ring is still filling.
    ///
    /// When the Gram system is not positive definite (consecutive snapshots
    /// identical, typically at stagnation) the newest snapshot is returned
    /// unchanged, so the caller's acceleration round is a no-op rather than
    /// a failure.
    pub fn extrapolate(&self) -> Option<Array1<F>> {
        if !self.is_full() {
            return None;
        }
        let n = self.snaps[0].len();
        let mut diffs = Array2::<F>::zeros((self.cap - 1, n));
        for k in 0..self.cap - 1 {
            let newer = self.snapshot(k + 1);
            let older = self.snapshot(k);
            for i in 0..n {
                diffs[[k, i]] = newer[i] - older[i];
            }
        }
        let mut gram = Array2::<F>::zeros((self.cap - 1, self.cap - 1));
        for a in 0..self.cap - 1 {
            for b in a..self.cap - 1 {
                let g = diffs.row(a).dot(&diffs.row(b));
                gram[[a, b]] = g;
                gram[[b, a]] = g;
            }
        }
        match combination_weights(&gram) {
            Some(weights) => {
                let mut acc = Array1::<F>::zeros(n);
                for k in 0..self.cap - 1 {
                    acc.scaled_add(weights[k], self.snapshot(k));
                }
                Some(acc)
            }
            None => {
                log::warn!("extrapolation system is not positive definite, keeping the latest fit");
                Some(self.snapshot(self.cap - 1).clone())
            }
        }
    }
}

/// Solves `gram · c = 1` with a Cholesky factorization and normalizes `c` to
/// sum to one. `None` when the factorization fails or the solution cannot be
/// normalized.
pub(crate) fn combination_weights<F: Float>(gram: &Array2<F>) -> Option<Array1<F>> {
    let k = gram.nrows();
    let sys: Array2<F::Lapack> = gram.mapv(|v| NumCast::from(v).unwrap());
    let rhs: Array1<F::Lapack> = Array1::from_elem(k, NumCast::from(1.0).unwrap());
    // The Cholesky factorization is the positive definiteness test; a
    // rank-deficient Gram matrix (stalled snapshots) fails here.
    sys.cholesky(UPLO::Upper).ok()?;
    let solution = sys.solve(&rhs).ok()?;
    let mut weights: Array1<F> = solution.mapv(|v| F::cast(v));
    let total = weights.sum();
    if total == F::zero() || !total.is_finite() {
        return None;
    }
    weights.mapv_inplace(|v| v / total);
    Some(weights)
}
