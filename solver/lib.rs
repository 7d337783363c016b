//! # Working-set coordinate descent for L1-regularized linear models
//!
//! This crate solves the Lasso and sparse logistic regression over dense or
//! compressed-by-feature sparse design matrices. Three accelerants make it
//! scale to high-dimensional problems:
//!
//! 1. **Working sets**: each outer iteration optimizes a small, growing
//!    subset of candidate features instead of sweeping all of them.
//! 2. **Gap safe screening**: features whose optimal coefficient is provably
//!    zero are eliminated permanently, using a radius derived from the
//!    duality gap.
//! 3. **Dual extrapolation**: the last few fitted-value iterates are combined
//!    through a small least-squares solve into a tighter feasible dual point,
//!    which sharpens both the convergence certificate and the screening rule.
//!
//! The primary entry point is [`solve`], which minimizes one problem at a
//! fixed regularization strength and mutates the caller's coefficient, fit
//! and dual vectors in place. [`solve_path`] runs a warm-started sweep over a
//! decreasing grid of strengths.

pub mod accel;
pub mod cd;
pub mod design;
pub mod driver;
pub mod objective;
pub mod path;
pub mod screening;
pub mod types;

use std::iter::Sum;

use ndarray::NdFloat;
use num_traits::NumCast;

pub use crate::design::{DesignMatrix, SparseColumns, compute_fit};
pub use crate::driver::solve;
pub use crate::path::{PathReport, alpha_grid, alpha_max, initial_dual_point, solve_path};
pub use crate::types::{SolveParams, SolveReport, SolverError, SubproblemStatus, Task};

/// Floating-point element type of a solve call, implemented for `f32` and
/// `f64`. The associated `Lapack` type carries the LAPACK-backed capability
/// needed for the extrapolation module's positive-definite solve, kept off
/// the main bound so that `num_traits::Float` methods resolve unambiguously.
pub trait Float: NdFloat + Sum {
    type Lapack: ndarray_linalg::Scalar + ndarray_linalg::Lapack;

    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {
    type Lapack = f32;
}

impl Float for f64 {
    type Lapack = f64;
}
