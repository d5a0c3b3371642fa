//! Ordinary least squares fits for the hormone panel
//!
//! One interaction model per hormone (`conc ~ no3 * treatment`) plus the
//! per-treatment simple trends the scatter plots overlay.

use log::warn;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::design::{constant_columns, interaction_design, trend_design, COEF_NAMES};
use super::linalg::{cross_product, cross_product_vec, invert_symmetric, solve_symmetric};
use crate::data::{Hormone, HormoneTable, Treatment};
use crate::error::{CkError, Result};

/// One estimated coefficient with its inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientEstimate {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub t_value: f64,
    pub p_value: f64,
}

impl CoefficientEstimate {
    /// Conventional significance marker for the p-value
    pub fn stars(&self) -> &'static str {
        if !self.p_value.is_finite() {
            ""
        } else if self.p_value < 0.001 {
            "***"
        } else if self.p_value < 0.01 {
            "**"
        } else if self.p_value < 0.05 {
            "*"
        } else if self.p_value < 0.1 {
            "."
        } else {
            ""
        }
    }
}

/// Fitted interaction model for one hormone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearFit {
    pub hormone: Hormone,
    /// Confidence level used for the intervals
    pub level: f64,
    /// Coefficients in design order: Intercept, NO3, LCO, NO3:LCO
    pub coefficients: Vec<CoefficientEstimate>,
    pub residual_df: f64,
    pub sigma2: f64,
}

/// Confidence band of a per-treatment trend line, evaluated on a grid
#[derive(Debug, Clone)]
pub struct TrendBand {
    pub treatment: Treatment,
    pub no3: Vec<f64>,
    pub fit: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Internal OLS result shared between the interaction model and the trends
struct OlsFit {
    beta: Array1<f64>,
    /// (X'X)^-1, unscaled by sigma^2
    cov_unscaled: Array2<f64>,
    sigma2: f64,
    df: f64,
}

fn ols(design: &Array2<f64>, response: &Array1<f64>) -> Result<OlsFit> {
    let (n, p) = design.dim();
    let xtx = cross_product(design);
    let xty = cross_product_vec(design, response);

    let beta = solve_symmetric(&xtx, &xty)?;
    let cov_unscaled = invert_symmetric(&xtx)?;

    let mut rss = 0.0;
    for i in 0..n {
        let mut fitted = 0.0;
        for j in 0..p {
            fitted += design[[i, j]] * beta[j];
        }
        let resid = response[i] - fitted;
        rss += resid * resid;
    }

    let df = n as f64 - p as f64;
    let sigma2 = if df > 0.0 { rss / df } else { f64::NAN };

    Ok(OlsFit {
        beta,
        cov_unscaled,
        sigma2,
        df,
    })
}

/// Two-sided p-value of a t-statistic
fn t_p_value(t: f64, df: f64) -> f64 {
    if !t.is_finite() || df <= 0.0 {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * dist.cdf(-t.abs()),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail t quantile for a two-sided interval at the given level
fn t_quantile(level: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => dist.inverse_cdf(0.5 + level / 2.0),
        Err(_) => f64::NAN,
    }
}

/// Fit `conc = intercept + b1*no3 + b2*lco + b3*no3*lco` for one hormone.
///
/// A dose series without variation (all rows at one nitrate level) still
/// fits: the unidentifiable coefficients come out near zero with very wide
/// intervals, and a warning names the degenerate columns.
pub fn fit_interaction_model(table: &HormoneTable, level: f64) -> Result<LinearFit> {
    if !(level > 0.0 && level < 1.0) {
        return Err(CkError::FitFailed {
            reason: format!("confidence level {} outside (0, 1)", level),
        });
    }

    let (design, response) = interaction_design(table)?;
    let degenerate = constant_columns(&design);
    if !degenerate.is_empty() {
        let names: Vec<&str> = degenerate.iter().map(|&j| COEF_NAMES[j]).collect();
        warn!(
            "{}: design columns {:?} have no variation; their estimates are not identifiable",
            table.hormone(),
            names
        );
    }

    let fit = ols(&design, &response)?;
    let tq = t_quantile(level, fit.df);

    let coefficients = COEF_NAMES
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = fit.beta[j];
            let std_error = (fit.sigma2 * fit.cov_unscaled[[j, j]]).sqrt();
            let t_value = estimate / std_error;
            CoefficientEstimate {
                name: name.to_string(),
                estimate,
                std_error,
                ci_low: estimate - tq * std_error,
                ci_high: estimate + tq * std_error,
                t_value,
                p_value: t_p_value(t_value, fit.df),
            }
        })
        .collect();

    Ok(LinearFit {
        hormone: table.hormone(),
        level,
        coefficients,
        residual_df: fit.df,
        sigma2: fit.sigma2,
    })
}

/// Fit the whole hormone panel, in panel order.
pub fn fit_hormone_panel(tables: &[HormoneTable], level: f64) -> Result<Vec<LinearFit>> {
    tables
        .iter()
        .map(|table| fit_interaction_model(table, level))
        .collect()
}

/// Simple `conc ~ no3` trend with its mean confidence band for one
/// treatment's rows, evaluated on `n_points` across the observed range.
///
/// Returns `None` when the treatment has fewer than three rows, which is
/// too few for a residual degree of freedom.
pub fn treatment_trend(
    table: &HormoneTable,
    treatment: Treatment,
    level: f64,
    n_points: usize,
) -> Result<Option<TrendBand>> {
    let records = table.records_for(treatment);
    if records.len() < 3 {
        warn!(
            "{}: only {} {} rows, skipping trend line",
            table.hormone(),
            records.len(),
            treatment
        );
        return Ok(None);
    }

    let n_points = n_points.max(2);
    let (design, response) = trend_design(&records);
    let fit = ols(&design, &response)?;
    let tq = t_quantile(level, fit.df);

    let (lo, hi) = table.no3_range();
    let span = hi - lo;
    let mut no3 = Vec::with_capacity(n_points);
    let mut fitted = Vec::with_capacity(n_points);
    let mut lower = Vec::with_capacity(n_points);
    let mut upper = Vec::with_capacity(n_points);

    for i in 0..n_points {
        let x = lo + span * i as f64 / (n_points - 1) as f64;
        let mean = fit.beta[0] + fit.beta[1] * x;
        // var(mean at x) = sigma^2 * [1 x] (X'X)^-1 [1 x]'
        let quad = fit.cov_unscaled[[0, 0]]
            + 2.0 * x * fit.cov_unscaled[[0, 1]]
            + x * x * fit.cov_unscaled[[1, 1]];
        let se = (fit.sigma2 * quad).sqrt();
        no3.push(x);
        fitted.push(mean);
        lower.push(mean - tq * se);
        upper.push(mean + tq * se);
    }

    Ok(Some(TrendBand {
        treatment,
        no3,
        fit: fitted,
        lower,
        upper,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HormoneRecord;

    fn table(rows: &[(f64, Treatment, f64)]) -> HormoneTable {
        let records = rows
            .iter()
            .map(|&(no3, treatment, conc)| HormoneRecord {
                hormone: Hormone::Ip,
                no3,
                treatment,
                conc,
            })
            .collect();
        HormoneTable::new(Hormone::Ip, records).unwrap()
    }

    fn noise(i: usize) -> f64 {
        // Small deterministic perturbation so residual variance is nonzero
        ((i * 37 % 11) as f64 - 5.0) * 1e-3
    }

    #[test]
    fn test_recovers_known_coefficients() {
        // conc = 0.5 + 0.2*no3 + 1.0*lco + 0.3*no3*lco
        let doses = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0];
        let mut rows = Vec::new();
        for &no3 in &doses {
            for &treatment in &Treatment::ALL {
                // Replicate noise balanced within each cell, so the cell
                // means (and the estimates) stay exact
                for rep in 0..3 {
                    let eps = [-1e-3, 0.0, 1e-3][rep];
                    let lco = treatment.indicator();
                    let conc = 0.5 + 0.2 * no3 + 1.0 * lco + 0.3 * no3 * lco + eps;
                    rows.push((no3, treatment, conc));
                }
            }
        }

        let fit = fit_interaction_model(&table(&rows), 0.95).unwrap();
        let estimates: Vec<f64> = fit.coefficients.iter().map(|c| c.estimate).collect();
        assert!((estimates[0] - 0.5).abs() < 0.01, "intercept {}", estimates[0]);
        assert!((estimates[1] - 0.2).abs() < 0.01, "no3 slope {}", estimates[1]);
        assert!((estimates[2] - 1.0).abs() < 0.01, "lco effect {}", estimates[2]);
        assert!((estimates[3] - 0.3).abs() < 0.01, "interaction {}", estimates[3]);

        // Strong effects on generous replication should all be significant
        assert!(fit.coefficients[1].p_value < 0.001);
        assert!(fit.coefficients[3].p_value < 0.001);
        // Intervals bracket the estimates
        for coef in &fit.coefficients {
            assert!(coef.ci_low < coef.estimate && coef.estimate < coef.ci_high);
        }
    }

    #[test]
    fn test_degenerate_dose_series() {
        // All measurements at no3 = 0: intercept and treatment effect are
        // identifiable, slope and interaction are not and pin to ~0.
        let mut rows = Vec::new();
        for _ in 0..10 {
            rows.push((0.0, Treatment::Mock, 0.1));
            rows.push((0.0, Treatment::Lco, 0.5));
        }

        let fit = fit_interaction_model(&table(&rows), 0.95).unwrap();
        let estimates: Vec<f64> = fit.coefficients.iter().map(|c| c.estimate).collect();
        assert!((estimates[0] - 0.1).abs() < 1e-6, "intercept {}", estimates[0]);
        assert!((estimates[2] - 0.4).abs() < 1e-6, "lco effect {}", estimates[2]);
        assert!(estimates[1].abs() < 1e-6, "no3 slope {}", estimates[1]);
        assert!(estimates[3].abs() < 1e-6, "interaction {}", estimates[3]);
    }

    #[test]
    fn test_panel_order_is_preserved() {
        let rows: Vec<(f64, Treatment, f64)> = (0..12)
            .map(|i| {
                let no3 = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0][i % 6];
                let treatment = if i % 2 == 0 { Treatment::Mock } else { Treatment::Lco };
                (no3, treatment, 0.3 + 0.1 * no3 + noise(i))
            })
            .collect();

        let tables: Vec<HormoneTable> = Hormone::ALL
            .iter()
            .map(|&hormone| {
                let records = rows
                    .iter()
                    .map(|&(no3, treatment, conc)| HormoneRecord {
                        hormone,
                        no3,
                        treatment,
                        conc,
                    })
                    .collect();
                HormoneTable::new(hormone, records).unwrap()
            })
            .collect();

        let fits = fit_hormone_panel(&tables, 0.95).unwrap();
        let order: Vec<Hormone> = fits.iter().map(|f| f.hormone).collect();
        assert_eq!(order, Hormone::ALL.to_vec());
        for fit in &fits {
            assert_eq!(fit.coefficients.len(), 4);
        }
    }

    #[test]
    fn test_trend_band_brackets_fit() {
        let rows: Vec<(f64, Treatment, f64)> = (0..18)
            .map(|i| {
                let no3 = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0][i % 6];
                (no3, Treatment::Mock, 1.0 + 0.5 * no3 + noise(i))
            })
            .collect();

        let band = treatment_trend(&table(&rows), Treatment::Mock, 0.95, 50)
            .unwrap()
            .unwrap();
        assert_eq!(band.no3.len(), 50);
        assert_eq!(band.no3[0], 0.0);
        assert_eq!(*band.no3.last().unwrap(), 16.0);
        for i in 0..band.no3.len() {
            assert!(band.lower[i] <= band.fit[i]);
            assert!(band.fit[i] <= band.upper[i]);
        }
    }

    #[test]
    fn test_trend_skipped_for_tiny_group() {
        let rows = vec![
            (0.0, Treatment::Mock, 0.5),
            (1.0, Treatment::Mock, 0.6),
            (2.0, Treatment::Mock, 0.7),
            (0.0, Treatment::Lco, 0.9),
        ];
        let band = treatment_trend(&table(&rows), Treatment::Lco, 0.95, 20).unwrap();
        assert!(band.is_none());
    }

    #[test]
    fn test_stars_thresholds() {
        let coef = |p: f64| CoefficientEstimate {
            name: "x".to_string(),
            estimate: 1.0,
            std_error: 1.0,
            ci_low: 0.0,
            ci_high: 2.0,
            t_value: 1.0,
            p_value: p,
        };
        assert_eq!(coef(0.0005).stars(), "***");
        assert_eq!(coef(0.005).stars(), "**");
        assert_eq!(coef(0.03).stars(), "*");
        assert_eq!(coef(0.07).stars(), ".");
        assert_eq!(coef(0.5).stars(), "");
        assert_eq!(coef(f64::NAN).stars(), "");
    }
}
