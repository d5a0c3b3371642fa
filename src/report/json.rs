//! Machine-readable snapshot of the fitted models

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::model::{GamComparison, LinearFit};

/// One expression model in the snapshot
#[derive(Debug, Serialize)]
pub struct GamSummary {
    pub model: String,
    pub edf: f64,
    pub aic: f64,
    pub delta_aic: f64,
    pub lambda: Option<f64>,
    pub best: bool,
}

#[derive(Debug, Serialize)]
struct FitsSnapshot<'a> {
    hormones: &'a [LinearFit],
    expression: Vec<GamSummary>,
}

/// Summarize the GAM comparison for serialization.
pub fn gam_summaries(comparison: &GamComparison) -> Vec<GamSummary> {
    comparison
        .fits
        .iter()
        .enumerate()
        .map(|(i, fit)| GamSummary {
            model: fit.spec.label().to_string(),
            edf: fit.edf,
            aic: fit.aic,
            delta_aic: comparison.delta_aic(i),
            lambda: fit.lambda,
            best: i == comparison.best,
        })
        .collect()
}

/// Write `fits.json` with every hormone fit and the expression ranking.
pub fn write_fits_json<P: AsRef<Path>>(
    path: P,
    hormones: &[LinearFit],
    comparison: &GamComparison,
) -> Result<()> {
    let snapshot = FitsSnapshot {
        hormones,
        expression: gam_summaries(comparison),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}
