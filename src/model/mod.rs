//! Model fitting: per-hormone linear models and the expression GAMs

mod basis;
mod design;
mod gam;
mod linalg;
mod linear;

pub use basis::{difference_penalty, BSplineBasis};
pub use design::{interaction_design, interaction_row, COEF_NAMES};
pub use gam::{
    compare_expression_models, fit_expression_model, prediction_grid, GamComparison, GamFit,
    GamSpec, PredictionPoint, BASIS_DIM,
};
pub use linear::{
    fit_hormone_panel, fit_interaction_model, treatment_trend, CoefficientEstimate, LinearFit,
    TrendBand,
};
