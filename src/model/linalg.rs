//! Small dense symmetric solvers shared by both model stages
//!
//! The design matrices here are tiny (at most intercept + treatment + two
//! spline blocks), so a hand-rolled Cholesky is all the linear algebra the
//! crate needs.

use ndarray::{Array1, Array2};

use crate::error::{CkError, Result};

/// Floor applied to a non-positive Cholesky pivot.
///
/// A zero-variance design column produces an exactly zero pivot; flooring it
/// keeps the factorization finite and drives the corresponding coefficient
/// to zero with an enormous standard error instead of aborting the fit.
const PIVOT_FLOOR: f64 = 1e-12;

/// Lower-triangular Cholesky factor of a symmetric matrix.
pub fn cholesky_factor(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if n == 0 || a.ncols() != n {
        return Err(CkError::InvalidDesignMatrix {
            reason: format!("cannot factor a {}x{} matrix", a.nrows(), a.ncols()),
        });
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(CkError::FitFailed {
            reason: "non-finite entry in normal equations".to_string(),
        });
    }

    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 {
                    sum = PIVOT_FLOOR;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Ok(l)
}

/// Solve `L L' x = b` given the lower Cholesky factor.
pub fn solve_with_factor(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[[i, j]] * y[j];
        }
        y[i] = sum / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[[j, i]] * x[j];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// Solve the symmetric system `a x = b`.
pub fn solve_symmetric(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let l = cholesky_factor(a)?;
    Ok(solve_with_factor(&l, b))
}

/// Invert a symmetric positive (semi-)definite matrix by solving against
/// the identity columns.
pub fn invert_symmetric(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    let l = cholesky_factor(a)?;

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        let mut e = Array1::zeros(n);
        e[i] = 1.0;
        let col = solve_with_factor(&l, &e);
        for j in 0..n {
            inv[[j, i]] = col[j];
        }
    }
    Ok(inv)
}

/// X'X for a design matrix.
pub fn cross_product(x: &Array2<f64>) -> Array2<f64> {
    let (n, p) = x.dim();
    let mut xtx = Array2::zeros((p, p));
    for i in 0..n {
        for j in 0..p {
            let xij = x[[i, j]];
            if xij == 0.0 {
                continue;
            }
            for k in 0..p {
                xtx[[j, k]] += xij * x[[i, k]];
            }
        }
    }
    xtx
}

/// X'y for a design matrix and response.
pub fn cross_product_vec(x: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
    let (n, p) = x.dim();
    let mut xty = Array1::zeros(p);
    for i in 0..n {
        for j in 0..p {
            xty[j] += x[[i, j]] * y[i];
        }
    }
    xty
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_identity() {
        let a = array![[2.0, 0.0], [0.0, 4.0]];
        let b = array![2.0, 8.0];
        let x = solve_symmetric(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_general_spd() {
        // a = [[4,2],[2,3]], solution of a x = [10, 8] is [7/4, 3/2]
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![10.0, 8.0];
        let x = solve_symmetric(&a, &b).unwrap();
        assert!((x[0] - 1.75).abs() < 1e-10);
        assert!((x[1] - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_invert_matches_solve() {
        let a = array![[5.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 3.0]];
        let inv = invert_symmetric(&a).unwrap();
        let prod = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((prod[[i, j]] - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_zero_pivot_is_floored() {
        // Second row/column all zeros, as produced by a zero-variance
        // design column; the solve must stay finite with x[1] == 0.
        let a = array![[2.0, 0.0], [0.0, 0.0]];
        let b = array![4.0, 0.0];
        let x = solve_symmetric(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-10);
        assert_eq!(x[1], 0.0);

        let inv = invert_symmetric(&a).unwrap();
        assert!(inv[[1, 1]].is_finite());
        assert!(inv[[1, 1]] > 1e10);
    }

    #[test]
    fn test_cross_products() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
        let y = array![1.0, 2.0, 3.0];
        let xtx = cross_product(&x);
        assert_eq!(xtx, array![[3.0, 3.0], [3.0, 5.0]]);
        let xty = cross_product_vec(&x, &y);
        assert_eq!(xty, array![6.0, 8.0]);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let a = array![[f64::NAN, 0.0], [0.0, 1.0]];
        assert!(cholesky_factor(&a).is_err());
    }
}
