//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module solves the damped normal equations for the step, which blends
//! the Gauss-Newton and gradient descent directions, and inverts `J^T J` for
//! the parameter covariance. Both go through a plain Cholesky factorization.

use ndarray::{Array1, Array2};

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Solves `(J^T J + lambda * D) step = -J^T r`, where `D` is the diagonal
    /// of `J^T J` (floored at 1e-10 so unused parameters still get damped).
    ///
    /// Returns `None` if the damped matrix is not positive definite.
    pub fn calculate_step(j_t_j: &Array2<f64>, j_t_r: &Array1<f64>, lambda: f64) -> Option<Array1<f64>> {
        let mut augmented = j_t_j.clone();
        for i in 0..augmented.nrows() {
            augmented[[i, i]] += lambda * j_t_j[[i, i]].max(1e-10);
        }

        let l = cholesky(&augmented)?;
        Some(-solve_cholesky(&l, j_t_r))
    }

    /// Inverse of a symmetric positive definite matrix, `None` if singular.
    pub fn invert(a: &Array2<f64>) -> Option<Array2<f64>> {
        let n = a.nrows();
        let l = cholesky(a)?;
        let mut inv = Array2::zeros((n, n));
        for k in 0..n {
            let mut unit = Array1::zeros(n);
            unit[k] = 1.0;
            inv.column_mut(k).assign(&solve_cholesky(&l, &unit));
        }
        Some(inv)
    }
}

/// Lower-triangular Cholesky factor `L` with `L L^T = a`.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());

    let mut l = Array2::<f64>::zeros((n, n));
    for k in 0..n {
        let mut diag = a[[k, k]];
        for j in 0..k {
            diag -= l[[k, j]] * l[[k, j]];
        }
        if diag.is_nan() || diag <= 0.0 {
            return None;
        }
        let lkk = diag.sqrt();
        l[[k, k]] = lkk;

        for i in k + 1..n {
            let mut sum = a[[i, k]];
            for j in 0..k {
                sum -= l[[i, j]] * l[[k, j]];
            }
            l[[i, k]] = sum / lkk;
        }
    }
    Some(l)
}

/// Solves `L L^T x = b` by forward and backward substitution.
fn solve_cholesky(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();

    // Forward substitution (L * y = b)
    let mut y = b.clone();
    for i in 0..n {
        for j in 0..i {
            y[i] -= l[[i, j]] * y[j];
        }
        y[i] /= l[[i, i]];
    }

    // Backward substitution (L^T * x = y)
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        x[i] = y[i];
        for j in i + 1..n {
            x[i] -= l[[j, i]] * x[j];
        }
        x[i] /= l[[i, i]];
    }
    x
}
