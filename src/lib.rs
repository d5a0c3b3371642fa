//! ck_nitrate: cytokinin and NIN expression response analysis
//!
//! Quantifies how six cytokinin variants and NIN gene expression respond to
//! a nitrate dose series under a binary LCO elicitor treatment. One
//! interaction linear model is fit per hormone; four nested additive models
//! of expression are compared by AIC, and the winner supplies the
//! prediction curves for the expression plot.
//!
//! # Example
//!
//! ```ignore
//! use ck_nitrate::prelude::*;
//!
//! let panel = load_hormone_panel("data")?;
//! let fits = fit_hormone_panel(&panel, 0.95)?;
//!
//! let expression = load_expression_table("data/NIN.csv")?;
//! let comparison = compare_expression_models(&expression)?;
//! println!("{}", aic_table(&comparison));
//! ```

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod report;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::{
        expression_no3_range, load_expression_table, load_hormone_panel, load_hormone_table,
        ExpressionRecord, Hormone, HormoneRecord, HormoneTable, Treatment, EXPRESSION_FILE,
    };
    pub use crate::error::{CkError, Result};
    pub use crate::model::{
        compare_expression_models, fit_hormone_panel, fit_interaction_model, prediction_grid,
        treatment_trend, GamComparison, GamFit, GamSpec, LinearFit, PredictionPoint, TrendBand,
    };
    pub use crate::report::{
        aic_table, coefficient_table, plot_expression, plot_hormone, write_fits_json,
        write_report,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    fn noise(i: usize) -> f64 {
        ((i * 29 % 17) as f64 - 8.0) * 1e-3
    }

    #[test]
    fn test_full_pipeline() {
        // Synthetic panel: every hormone rises with dose, LCO shifts the
        // level, and the zeatins also steepen under LCO
        let doses = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0];
        let tables: Vec<HormoneTable> = Hormone::ALL
            .iter()
            .map(|&hormone| {
                let interaction = match hormone {
                    Hormone::Cz | Hormone::CzR => 0.3,
                    _ => 0.0,
                };
                let mut records = Vec::new();
                for &no3 in &doses {
                    for &treatment in &Treatment::ALL {
                        // Replicate noise balanced within each cell so the
                        // coefficient estimates are exact
                        for rep in 0..3 {
                            let eps = [-1e-3, 0.0, 1e-3][rep];
                            let lco = treatment.indicator();
                            records.push(HormoneRecord {
                                hormone,
                                no3,
                                treatment,
                                conc: 0.5
                                    + 0.15 * no3
                                    + 0.8 * lco
                                    + interaction * no3 * lco
                                    + eps,
                            });
                        }
                    }
                }
                HormoneTable::new(hormone, records).unwrap()
            })
            .collect();

        let fits = fit_hormone_panel(&tables, 0.95).unwrap();
        assert_eq!(fits.len(), 6);
        let order: Vec<Hormone> = fits.iter().map(|f| f.hormone).collect();
        assert_eq!(order, Hormone::ALL.to_vec());

        // The zeatin interaction should be clearly significant, the
        // isopentenyladenine one should not
        let cz = &fits[0];
        assert!(cz.coefficients[3].p_value < 0.001);
        let ip = &fits[2];
        assert!(ip.coefficients[3].p_value > 0.05);

        let table = coefficient_table(&fits);
        assert_eq!(table.row_iter().count(), 4);

        // Expression with a strong by-treatment dose response
        let expression: Vec<ExpressionRecord> = (0..=32)
            .flat_map(|step| {
                let no3 = step as f64 * 0.5;
                Treatment::ALL.into_iter().enumerate().map(move |(k, treatment)| {
                    let response = match treatment {
                        Treatment::Mock => 1.0 + 0.02 * no3,
                        Treatment::Lco => 1.0 + 5.0 * (1.0 - (-no3 / 3.0).exp()),
                    };
                    ExpressionRecord {
                        no3,
                        treatment,
                        expression: response + noise(step * 2 + k),
                    }
                })
            })
            .collect();

        let comparison = compare_expression_models(&expression).unwrap();
        assert_eq!(comparison.fits.len(), 4);
        assert_eq!(comparison.best_fit().spec, GamSpec::SmoothByTreatment);

        let (lo, hi) = expression_no3_range(&expression);
        let grid = prediction_grid(lo, hi, 0.1).unwrap();
        let curve = comparison.best_fit().predict_curve(&grid);
        assert_eq!(curve.len(), 322);

        // Predicted LCO response at high dose well above Mock
        let lco_hi = curve
            .iter()
            .find(|p| p.treatment == Treatment::Lco && p.no3 == 16.0)
            .unwrap();
        let mock_hi = curve
            .iter()
            .find(|p| p.treatment == Treatment::Mock && p.no3 == 16.0)
            .unwrap();
        assert!(lco_hi.fit - mock_hi.fit > 3.0);
    }
}
