//! Cubic B-spline basis with a difference penalty
//!
//! The smooth terms of the expression models are P-splines: a modest
//! B-spline basis over the observed nitrate range combined with a
//! second-order difference penalty on the coefficients.

use ndarray::Array2;

use crate::error::{CkError, Result};

/// B-spline basis on a closed interval, open-uniform knot vector.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineBasis {
    knots: Vec<f64>,
    n_basis: usize,
    degree: usize,
    lo: f64,
    hi: f64,
}

impl BSplineBasis {
    /// Build a basis of `n_basis` functions of the given degree on
    /// `[lo, hi]`. Boundary knots are repeated `degree + 1` times and the
    /// interior knots are evenly spaced.
    pub fn new(lo: f64, hi: f64, n_basis: usize, degree: usize) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
            return Err(CkError::InvalidDesignMatrix {
                reason: format!("invalid spline range [{}, {}]", lo, hi),
            });
        }
        if n_basis < degree + 1 {
            return Err(CkError::InvalidDesignMatrix {
                reason: format!(
                    "{} basis functions is too few for degree {}",
                    n_basis, degree
                ),
            });
        }

        let n_interior = n_basis - degree - 1;
        let mut knots = vec![lo; degree + 1];
        for i in 1..=n_interior {
            knots.push(lo + (hi - lo) * i as f64 / (n_interior + 1) as f64);
        }
        knots.extend(std::iter::repeat(hi).take(degree + 1));

        Ok(Self {
            knots,
            n_basis,
            degree,
            lo,
            hi,
        })
    }

    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    /// Evaluate all basis functions at one point (Cox-de Boor recursion).
    /// Inputs outside the knot range are clamped to it.
    pub fn row(&self, x: f64) -> Vec<f64> {
        let x = x.clamp(self.lo, self.hi);
        let m = self.knots.len();
        let mut b = vec![0.0; m - 1];

        for i in 0..m - 1 {
            let inside = x >= self.knots[i] && x < self.knots[i + 1];
            // The right boundary belongs to the last non-empty interval
            let at_end = x == self.hi && self.knots[i] < self.hi && self.knots[i + 1] == self.hi;
            if inside || at_end {
                b[i] = 1.0;
            }
        }

        for d in 1..=self.degree {
            for i in 0..m - 1 - d {
                let left_den = self.knots[i + d] - self.knots[i];
                let right_den = self.knots[i + d + 1] - self.knots[i + 1];
                let left = if left_den > 0.0 {
                    (x - self.knots[i]) / left_den * b[i]
                } else {
                    0.0
                };
                let right = if right_den > 0.0 {
                    (self.knots[i + d + 1] - x) / right_den * b[i + 1]
                } else {
                    0.0
                };
                b[i] = left + right;
            }
        }

        b.truncate(self.n_basis);
        b
    }

    /// Evaluate the basis at every point, one row per point.
    pub fn evaluate(&self, xs: &[f64]) -> Array2<f64> {
        let mut out = Array2::zeros((xs.len(), self.n_basis));
        for (i, &x) in xs.iter().enumerate() {
            for (j, value) in self.row(x).into_iter().enumerate() {
                out[[i, j]] = value;
            }
        }
        out
    }
}

/// Penalty matrix D'D for differences of the given order on `n_basis`
/// coefficients. Order 2 penalizes curvature and leaves constant and linear
/// coefficient patterns unpenalized.
pub fn difference_penalty(n_basis: usize, order: usize) -> Array2<f64> {
    // Build D by differencing the identity `order` times
    let mut d: Array2<f64> = Array2::eye(n_basis);
    for _ in 0..order {
        let (rows, cols) = d.dim();
        if rows < 2 {
            break;
        }
        let mut next = Array2::zeros((rows - 1, cols));
        for i in 0..rows - 1 {
            for j in 0..cols {
                next[[i, j]] = d[[i + 1, j]] - d[[i, j]];
            }
        }
        d = next;
    }

    let (rows, cols) = d.dim();
    let mut s = Array2::zeros((cols, cols));
    for i in 0..rows {
        for j in 0..cols {
            if d[[i, j]] == 0.0 {
                continue;
            }
            for k in 0..cols {
                s[[j, k]] += d[[i, j]] * d[[i, k]];
            }
        }
    }
    s
}
