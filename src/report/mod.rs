//! Report rendering: tables, plots, and the JSON snapshot

mod json;
mod plots;
mod tables;

pub use json::{gam_summaries, write_fits_json, GamSummary};
pub use plots::{plot_expression, plot_hormone};
pub use tables::{aic_table, coefficient_table, write_report};
