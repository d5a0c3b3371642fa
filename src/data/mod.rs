//! Measurement data structures and CSV loading

mod hormone;
mod loader;
mod records;

pub use hormone::{Hormone, Treatment};
pub use loader::{
    load_expression_table, load_hormone_panel, load_hormone_table, EXPRESSION_FILE,
};
pub use records::{expression_no3_range, ExpressionRecord, HormoneRecord, HormoneTable};
