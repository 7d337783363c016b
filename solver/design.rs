//! Design-matrix access.
//!
//! Every part of the solver touches the design matrix exclusively through
//! column operations: a dot product against a feature's column, a scaled
//! column added into a sample-length vector, a weighted squared column norm.
//! Those operations are gathered in the [`DesignMatrix`] trait, with one
//! implementation for dense `ndarray` storage and one for
//! compressed-by-feature sparse storage.
//!
//! Sparse inputs may carry a per-feature mean vector. When present, every
//! column operation behaves as if `mean_j` had been subtracted from column
//! `j`, so sparse matrices can be centered without densifying them. The
//! `v_sum` arguments exist for this: centered dot products need the sum of
//! the right-hand vector, and callers that loop over many columns compute it
//! once instead of once per column. Uncentered implementations ignore it.

use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix2};

use crate::Float;
use crate::types::Task;

pub trait DesignMatrix<F: Float> {
    fn n_samples(&self) -> usize;

    fn n_features(&self) -> usize;

    /// Whether column operations apply an implicit per-feature centering.
    fn is_centered(&self) -> bool;

    /// `⟨X_j, v⟩`. `v_sum` must equal `v.sum()` when `is_centered()`.
    fn dot_col(&self, j: usize, v: ArrayView1<F>, v_sum: F) -> F;

    /// `⟨X_j, g⟩` with the right-hand values produced per sample index, so
    /// callers can fold a fresh elementwise transform into the dot product
    /// without materializing it. `g_sum` as in [`Self::dot_col`].
    fn dot_col_with(&self, j: usize, g: impl Fn(usize) -> F, g_sum: F) -> F;

    /// `out ← out + scale·X_j`.
    fn axpy_col(&self, j: usize, scale: F, out: &mut Array1<F>);

    /// `Σᵢ wtsᵢ·x²ᵢⱼ`. `wts_sum` as in [`Self::dot_col`].
    fn weighted_sq_norm_col(&self, j: usize, wts: ArrayView1<F>, wts_sum: F) -> F;

    /// Euclidean norm of every (implicitly centered) column.
    fn column_norms(&self) -> Array1<F>;
}

impl<F: Float, S: Data<Elem = F>> DesignMatrix<F> for ArrayBase<S, Ix2> {
    fn n_samples(&self) -> usize {
        self.nrows()
    }

    fn n_features(&self) -> usize {
        self.ncols()
    }

    fn is_centered(&self) -> bool {
        false
    }

    fn dot_col(&self, j: usize, v: ArrayView1<F>, _v_sum: F) -> F {
        self.column(j).dot(&v)
    }

    fn dot_col_with(&self, j: usize, g: impl Fn(usize) -> F, _g_sum: F) -> F {
        self.column(j)
            .iter()
            .enumerate()
            .map(|(i, &x)| x * g(i))
            .sum()
    }

    fn axpy_col(&self, j: usize, scale: F, out: &mut Array1<F>) {
        out.scaled_add(scale, &self.column(j));
    }

    fn weighted_sq_norm_col(&self, j: usize, wts: ArrayView1<F>, _wts_sum: F) -> F {
        self.column(j)
            .iter()
            .zip(wts.iter())
            .map(|(&x, &wt)| wt * x * x)
            .sum()
    }

    fn column_norms(&self) -> Array1<F> {
        let norms: Vec<F> = (0..self.ncols())
            .map(|j| {
                let col = self.column(j);
                col.dot(&col).sqrt()
            })
            .collect();
        Array1::from_vec(norms)
    }
}

/// Compressed-by-feature sparse storage. Column `j`'s nonzero values are
/// `data[indptr[j]..indptr[j + 1]]`, located at the row positions given by
/// the matching slice of `indices`. An optional mean vector centers each
/// column implicitly.
pub struct SparseColumns<'a, F: Float> {
    data: ArrayView1<'a, F>,
    indices: &'a [usize],
    indptr: &'a [usize],
    n_samples: usize,
    means: Option<ArrayView1<'a, F>>,
}

impl<'a, F: Float> SparseColumns<'a, F> {
    pub fn new(
        data: ArrayView1<'a, F>,
        indices: &'a [usize],
        indptr: &'a [usize],
        n_samples: usize,
        means: Option<ArrayView1<'a, F>>,
    ) -> Self {
        assert!(!indptr.is_empty(), "indptr must have n_features + 1 entries");
        assert_eq!(indices.len(), data.len());
        assert_eq!(*indptr.last().unwrap(), data.len());
        if let Some(m) = &means {
            assert_eq!(m.len(), indptr.len() - 1);
        }
        SparseColumns {
            data,
            indices,
            indptr,
            n_samples,
            means,
        }
    }

    fn col_range(&self, j: usize) -> std::ops::Range<usize> {
        self.indptr[j]..self.indptr[j + 1]
    }

    fn mean(&self, j: usize) -> F {
        self.means.as_ref().map_or(F::zero(), |m| m[j])
    }
}

impl<F: Float> DesignMatrix<F> for SparseColumns<'_, F> {
    fn n_samples(&self) -> usize {
        self.n_samples
    }

    fn n_features(&self) -> usize {
        self.indptr.len() - 1
    }

    fn is_centered(&self) -> bool {
        self.means.is_some()
    }

    fn dot_col(&self, j: usize, v: ArrayView1<F>, v_sum: F) -> F {
        let mut acc = F::zero();
        for k in self.col_range(j) {
            acc = acc + self.data[k] * v[self.indices[k]];
        }
        if self.is_centered() {
            acc = acc - self.mean(j) * v_sum;
        }
        acc
    }

    fn dot_col_with(&self, j: usize, g: impl Fn(usize) -> F, g_sum: F) -> F {
        let mut acc = F::zero();
        for k in self.col_range(j) {
            acc = acc + self.data[k] * g(self.indices[k]);
        }
        if self.is_centered() {
            acc = acc - self.mean(j) * g_sum;
        }
        acc
    }

    fn axpy_col(&self, j: usize, scale: F, out: &mut Array1<F>) {
        for k in self.col_range(j) {
            out[self.indices[k]] = out[self.indices[k]] + scale * self.data[k];
        }
        if self.is_centered() {
            let shift = scale * self.mean(j);
            out.mapv_inplace(|o| o - shift);
        }
    }

    fn weighted_sq_norm_col(&self, j: usize, wts: ArrayView1<F>, wts_sum: F) -> F {
        let mean = self.mean(j);
        let mut acc = F::zero();
        for k in self.col_range(j) {
            let x = self.data[k];
            let wt = wts[self.indices[k]];
            acc = acc + wt * x * (x - F::cast(2.0) * mean);
        }
        if self.is_centered() {
            acc = acc + mean * mean * wts_sum;
        }
        acc
    }

    fn column_norms(&self) -> Array1<F> {
        let n = F::cast(self.n_samples);
        let norms: Vec<F> = (0..self.n_features())
            .map(|j| {
                let mut sq = F::zero();
                let mut sum = F::zero();
                for k in self.col_range(j) {
                    sq = sq + self.data[k] * self.data[k];
                    sum = sum + self.data[k];
                }
                let mean = self.mean(j);
                (sq - F::cast(2.0) * mean * sum + n * mean * mean).sqrt()
            })
            .collect();
        Array1::from_vec(norms)
    }
}

/// Builds the fit vector consistent with `w`: the residual `y − Xw` for the
/// Lasso, the margin `Xw` for logistic regression.
pub fn compute_fit<F: Float, D: DesignMatrix<F>>(
    design: &D,
    y: ArrayView1<F>,
    w: ArrayView1<F>,
    task: Task,
) -> Array1<F> {
    let mut xw = Array1::<F>::zeros(design.n_samples());
    for j in 0..design.n_features() {
        if w[j] != F::zero() {
            design.axpy_col(j, w[j], &mut xw);
        }
    }
    match task {
        Task::Lasso => &y - &xw,
        Task::Logistic => xw,
    }
}
