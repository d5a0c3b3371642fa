//! Nested Gaussian additive models of expression and their AIC comparison
//!
//! Four specifications of increasing structure are fit to the same
//! expression dataset and ranked by AIC. The winning model supplies the
//! prediction curves (with standard errors) drawn by the expression plot.
//!
//! Smooth terms are P-splines: the full B-spline basis carries the curve
//! including its level (constants sit in the penalty null space), so the
//! smooth models need no separate intercept column and the by-treatment
//! blocks absorb the treatment main effect.

use log::{debug, info};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::basis::{difference_penalty, BSplineBasis};
use super::linalg::{
    cholesky_factor, cross_product, cross_product_vec, invert_symmetric, solve_with_factor,
};
use crate::data::{expression_no3_range, ExpressionRecord, Treatment};
use crate::error::{CkError, Result};

/// Basis dimension of each smooth term. Deliberately modest for the sample
/// sizes this assay produces.
pub const BASIS_DIM: usize = 6;
const SPLINE_DEGREE: usize = 3;
const PENALTY_ORDER: usize = 2;

/// Floor on the ML variance estimate so a perfectly constant response
/// still yields finite log-likelihoods.
const SIGMA2_FLOOR: f64 = 1e-12;

/// Candidate smoothing parameters: a fixed log-spaced grid
const LAMBDA_GRID_SIZE: usize = 41;
const LOG10_LAMBDA_MIN: f64 = -6.0;
const LOG10_LAMBDA_MAX: f64 = 6.0;

/// The four competing model specifications, in comparison order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamSpec {
    /// expression ~ 1
    Intercept,
    /// expression ~ s(no3)
    SmoothNo3,
    /// expression ~ treatment
    TreatmentOnly,
    /// expression ~ s(no3, by = treatment), per-treatment levels included
    SmoothByTreatment,
}

impl GamSpec {
    /// All specifications in comparison (and tie-break) order
    pub const ALL: [GamSpec; 4] = [
        GamSpec::Intercept,
        GamSpec::SmoothNo3,
        GamSpec::TreatmentOnly,
        GamSpec::SmoothByTreatment,
    ];

    /// Row label used in the AIC table
    pub fn label(&self) -> &'static str {
        match self {
            GamSpec::Intercept => "Intercept",
            GamSpec::SmoothNo3 => "NO3",
            GamSpec::TreatmentOnly => "LCO",
            GamSpec::SmoothByTreatment => "NO3 + LCO",
        }
    }
}

/// How a fitted model maps an input point to a design row
#[derive(Debug, Clone)]
enum SmoothStructure {
    /// `[1]`
    InterceptOnly,
    /// `[basis]`, one shared smooth
    Shared { basis: BSplineBasis },
    /// `[1, lco]`
    TreatmentMain,
    /// `[mock block | lco block]`, each row populating its group's block
    ByTreatment { basis: BSplineBasis },
}

/// One fitted model
#[derive(Debug, Clone)]
pub struct GamFit {
    pub spec: GamSpec,
    /// Akaike information criterion (Gaussian, ML scale estimate)
    pub aic: f64,
    /// Effective degrees of freedom of the linear smoother
    pub edf: f64,
    /// Selected smoothing parameter, if the model has a smooth term
    pub lambda: Option<f64>,
    /// Residual variance estimate used for prediction standard errors
    pub sigma2: f64,
    coef: Array1<f64>,
    /// (X'X + lambda*S)^-1, unscaled posterior covariance
    cov_unscaled: Array2<f64>,
    structure: SmoothStructure,
}

/// One point of a prediction curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub no3: f64,
    pub treatment: Treatment,
    pub fit: f64,
    pub se: f64,
}

/// The four fits with the AIC winner marked
#[derive(Debug, Clone)]
pub struct GamComparison {
    /// Fits in `GamSpec::ALL` order
    pub fits: Vec<GamFit>,
    /// Index of the winning fit
    pub best: usize,
}

impl GamComparison {
    pub fn best_fit(&self) -> &GamFit {
        &self.fits[self.best]
    }

    /// AIC distance of fit `i` from the winner
    pub fn delta_aic(&self, i: usize) -> f64 {
        self.fits[i].aic - self.fits[self.best].aic
    }
}

impl GamFit {
    fn design_row(&self, no3: f64, treatment: Treatment) -> Vec<f64> {
        match &self.structure {
            SmoothStructure::InterceptOnly => vec![1.0],
            SmoothStructure::Shared { basis } => basis.row(no3),
            SmoothStructure::TreatmentMain => vec![1.0, treatment.indicator()],
            SmoothStructure::ByTreatment { basis } => {
                let k = basis.n_basis();
                let mut row = vec![0.0; 2 * k];
                let offset = match treatment {
                    Treatment::Mock => 0,
                    Treatment::Lco => k,
                };
                for (j, value) in basis.row(no3).into_iter().enumerate() {
                    row[offset + j] = value;
                }
                row
            }
        }
    }

    /// Predicted mean and standard error at one input point.
    ///
    /// Standard errors come from the penalized posterior covariance
    /// sigma^2 * (X'X + lambda*S)^-1.
    pub fn predict(&self, no3: f64, treatment: Treatment) -> PredictionPoint {
        let row = self.design_row(no3, treatment);
        let p = row.len();

        let mut fit = 0.0;
        for j in 0..p {
            fit += row[j] * self.coef[j];
        }

        let mut quad = 0.0;
        for j in 0..p {
            if row[j] == 0.0 {
                continue;
            }
            for k in 0..p {
                quad += row[j] * self.cov_unscaled[[j, k]] * row[k];
            }
        }
        let se = (self.sigma2 * quad).sqrt();

        PredictionPoint {
            no3,
            treatment,
            fit,
            se,
        }
    }

    /// Evaluate the model over a nitrate grid crossed with both treatments.
    /// All Mock rows come first, then all LCO rows, each in grid order.
    pub fn predict_curve(&self, grid: &[f64]) -> Vec<PredictionPoint> {
        let mut curve = Vec::with_capacity(2 * grid.len());
        for &treatment in &Treatment::ALL {
            for &no3 in grid {
                curve.push(self.predict(no3, treatment));
            }
        }
        curve
    }
}

/// Dense nitrate grid over a closed range. Both endpoints are included;
/// the last point is snapped to `hi` so the range stays closed under
/// floating-point stepping.
pub fn prediction_grid(lo: f64, hi: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(CkError::FitFailed {
            reason: format!("invalid prediction grid [{}, {}] step {}", lo, hi, step),
        });
    }
    let n = ((hi - lo) / step).round() as usize;
    let mut grid: Vec<f64> = (0..=n).map(|i| lo + i as f64 * step).collect();
    if let Some(last) = grid.last_mut() {
        *last = hi;
    }
    Ok(grid)
}

/// Assembled design matrix with its (possibly absent) penalty
struct ModelMatrices {
    design: Array2<f64>,
    penalty: Option<Array2<f64>>,
    structure: SmoothStructure,
}

fn build_matrices(records: &[ExpressionRecord], spec: GamSpec) -> Result<ModelMatrices> {
    let n = records.len();

    match spec {
        GamSpec::Intercept => Ok(ModelMatrices {
            design: Array2::ones((n, 1)),
            penalty: None,
            structure: SmoothStructure::InterceptOnly,
        }),

        GamSpec::TreatmentOnly => {
            let mut design = Array2::ones((n, 2));
            for (i, r) in records.iter().enumerate() {
                design[[i, 1]] = r.treatment.indicator();
            }
            Ok(ModelMatrices {
                design,
                penalty: None,
                structure: SmoothStructure::TreatmentMain,
            })
        }

        GamSpec::SmoothNo3 => {
            let (lo, hi) = expression_no3_range(records);
            let basis = BSplineBasis::new(lo, hi, BASIS_DIM, SPLINE_DEGREE)?;
            let xs: Vec<f64> = records.iter().map(|r| r.no3).collect();
            let design = basis.evaluate(&xs);
            let penalty = difference_penalty(basis.n_basis(), PENALTY_ORDER);

            Ok(ModelMatrices {
                design,
                penalty: Some(penalty),
                structure: SmoothStructure::Shared { basis },
            })
        }

        GamSpec::SmoothByTreatment => {
            let (lo, hi) = expression_no3_range(records);
            let basis = BSplineBasis::new(lo, hi, BASIS_DIM, SPLINE_DEGREE)?;
            let xs: Vec<f64> = records.iter().map(|r| r.no3).collect();
            let block = basis.evaluate(&xs);

            let k = basis.n_basis();
            let mut design = Array2::zeros((n, 2 * k));
            for i in 0..n {
                let offset = match records[i].treatment {
                    Treatment::Mock => 0,
                    Treatment::Lco => k,
                };
                for j in 0..k {
                    design[[i, offset + j]] = block[[i, j]];
                }
            }

            // One curvature penalty per smooth block, sharing the same
            // smoothing parameter
            let s_block = difference_penalty(k, PENALTY_ORDER);
            let mut penalty = Array2::zeros((2 * k, 2 * k));
            for a in 0..k {
                for b in 0..k {
                    penalty[[a, b]] = s_block[[a, b]];
                    penalty[[k + a, k + b]] = s_block[[a, b]];
                }
            }

            Ok(ModelMatrices {
                design,
                penalty: Some(penalty),
                structure: SmoothStructure::ByTreatment { basis },
            })
        }
    }
}

struct PenalizedSolution {
    coef: Array1<f64>,
    cov_unscaled: Array2<f64>,
    rss: f64,
    edf: f64,
}

/// Solve (X'X + lambda*S) beta = X'y and compute the rss and edf of the
/// resulting smoother.
fn penalized_solve(
    design: &Array2<f64>,
    response: &Array1<f64>,
    xtx: &Array2<f64>,
    xty: &Array1<f64>,
    penalty: Option<(&Array2<f64>, f64)>,
) -> Result<PenalizedSolution> {
    let (n, p) = design.dim();

    let mut a = xtx.clone();
    if let Some((s, lambda)) = penalty {
        for i in 0..p {
            for j in 0..p {
                a[[i, j]] += lambda * s[[i, j]];
            }
        }
    }

    let l = cholesky_factor(&a)?;
    let coef = solve_with_factor(&l, xty);
    let cov_unscaled = invert_symmetric(&a)?;

    let mut rss = 0.0;
    for i in 0..n {
        let mut fitted = 0.0;
        for j in 0..p {
            fitted += design[[i, j]] * coef[j];
        }
        let resid = response[i] - fitted;
        rss += resid * resid;
    }

    // edf = tr(A^-1 X'X)
    let mut edf = 0.0;
    for i in 0..p {
        for j in 0..p {
            edf += cov_unscaled[[i, j]] * xtx[[j, i]];
        }
    }

    Ok(PenalizedSolution {
        coef,
        cov_unscaled,
        rss,
        edf,
    })
}

/// Gaussian AIC on the ML variance scale, counting edf + 1 parameters
/// (the +1 is the variance).
fn gaussian_aic(n: usize, rss: f64, edf: f64) -> f64 {
    let n = n as f64;
    let sigma2_ml = (rss / n).max(SIGMA2_FLOOR);
    n * (2.0 * std::f64::consts::PI * sigma2_ml).ln() + n + 2.0 * (edf + 1.0)
}

/// Fit one model specification to the expression data.
pub fn fit_expression_model(records: &[ExpressionRecord], spec: GamSpec) -> Result<GamFit> {
    if records.is_empty() {
        return Err(CkError::EmptyData {
            reason: "no expression rows to fit".to_string(),
        });
    }

    let n = records.len();
    let response = Array1::from_iter(records.iter().map(|r| r.expression));
    let matrices = build_matrices(records, spec)?;
    let xtx = cross_product(&matrices.design);
    let xty = cross_product_vec(&matrices.design, &response);

    let (solution, lambda) = match &matrices.penalty {
        None => {
            let solution = penalized_solve(&matrices.design, &response, &xtx, &xty, None)?;
            (solution, None)
        }
        Some(s) => {
            // GCV over the fixed log-spaced grid; ties keep the first
            // (smallest) lambda
            let mut best: Option<(f64, PenalizedSolution, f64)> = None;
            for i in 0..LAMBDA_GRID_SIZE {
                let log10 = LOG10_LAMBDA_MIN
                    + (LOG10_LAMBDA_MAX - LOG10_LAMBDA_MIN) * i as f64
                        / (LAMBDA_GRID_SIZE - 1) as f64;
                let lambda = 10f64.powf(log10);
                let candidate =
                    penalized_solve(&matrices.design, &response, &xtx, &xty, Some((s, lambda)))?;
                let denom = n as f64 - candidate.edf;
                if denom <= 0.0 {
                    continue;
                }
                let gcv = n as f64 * candidate.rss / (denom * denom);
                debug!(
                    "{}: lambda={:.3e} edf={:.2} gcv={:.6}",
                    spec.label(),
                    lambda,
                    candidate.edf,
                    gcv
                );
                match &best {
                    Some((best_gcv, _, _)) if gcv >= *best_gcv => {}
                    _ => best = Some((gcv, candidate, lambda)),
                }
            }
            let (_, solution, lambda) = best.ok_or_else(|| CkError::FitFailed {
                reason: format!(
                    "no admissible smoothing parameter for '{}' with {} rows",
                    spec.label(),
                    n
                ),
            })?;
            (solution, Some(lambda))
        }
    };

    let aic = gaussian_aic(n, solution.rss, solution.edf);
    let resid_df = n as f64 - solution.edf;
    let sigma2 = if resid_df > 0.0 {
        solution.rss / resid_df
    } else {
        f64::NAN
    };

    info!(
        "fit '{}': edf={:.2} aic={:.2}{}",
        spec.label(),
        solution.edf,
        aic,
        lambda
            .map(|l| format!(" lambda={:.3e}", l))
            .unwrap_or_default()
    );

    Ok(GamFit {
        spec,
        aic,
        edf: solution.edf,
        lambda,
        sigma2,
        coef: solution.coef,
        cov_unscaled: solution.cov_unscaled,
        structure: matrices.structure,
    })
}

/// Index of the strict minimum; exact ties keep the earliest entry.
pub(crate) fn argmin_strict(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = i;
        }
    }
    best
}

/// Fit all four specifications and rank them by AIC.
pub fn compare_expression_models(records: &[ExpressionRecord]) -> Result<GamComparison> {
    let fits: Vec<GamFit> = GamSpec::ALL
        .iter()
        .map(|&spec| fit_expression_model(records, spec))
        .collect::<Result<_>>()?;

    let aics: Vec<f64> = fits.iter().map(|f| f.aic).collect();
    let best = argmin_strict(&aics);
    info!(
        "best expression model by AIC: '{}' ({:.2})",
        fits[best].spec.label(),
        fits[best].aic
    );

    Ok(GamComparison { fits, best })
}
