//! CSV loading for the hormone panel and the expression table
//!
//! Measurement files are semicolon-delimited. Hormone files use a decimal
//! point; the expression file comes out of a different export path and uses
//! a decimal comma throughout.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::info;

use super::hormone::{Hormone, Treatment};
use super::records::{ExpressionRecord, HormoneRecord, HormoneTable};
use crate::error::{CkError, Result};

/// Raw column holding the nitrate dose, mM
const NO3_COLUMN: &str = "NO3";
/// Raw column holding the hormone concentration, renamed to `conc`
const CONC_COLUMN: &str = "pmol_gFW";
/// Raw column holding the `+`/`-` treatment marker
const TREATMENT_COLUMN: &str = "LCO";
/// Raw column holding relative expression, renamed to `expression`
const EXPRESSION_COLUMN: &str = "NIN";

/// Default file name of the expression table inside the data directory
pub const EXPRESSION_FILE: &str = "NIN.csv";

/// Load one hormone's measurement file and tag every row with the hormone.
///
/// Renames the raw concentration column to the canonical `conc` field and
/// recodes the `+`/`-` marker into [`Treatment`], preserving row order.
pub fn load_hormone_table<P: AsRef<Path>>(path: P, hormone: Hormone) -> Result<HormoneTable> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_path(path)?;

    let header = reader.headers()?.clone();
    let no3_idx = column_index(&header, NO3_COLUMN, path)?;
    let conc_idx = column_index(&header, CONC_COLUMN, path)?;
    let treatment_idx = column_index(&header, TREATMENT_COLUMN, path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(HormoneRecord {
            hormone,
            no3: parse_point_decimal(&row, no3_idx, NO3_COLUMN, path)?,
            treatment: Treatment::from_code(
                field(&row, treatment_idx, TREATMENT_COLUMN, path)?,
                &path.display().to_string(),
            )?,
            conc: parse_point_decimal(&row, conc_idx, CONC_COLUMN, path)?,
        });
    }

    info!(
        "loaded {} rows for {} from {}",
        records.len(),
        hormone,
        path.display()
    );
    HormoneTable::new(hormone, records)
}

/// Load the full hormone panel from a directory, in panel order.
///
/// Expects one `<stem>.csv` per hormone (`CZ.csv`, `CZr.csv`, ...). Any
/// missing or malformed file aborts the whole run.
pub fn load_hormone_panel<P: AsRef<Path>>(dir: P) -> Result<Vec<HormoneTable>> {
    let dir = dir.as_ref();
    Hormone::ALL
        .iter()
        .map(|&hormone| {
            let path = dir.join(format!("{}.csv", hormone.file_stem()));
            load_hormone_table(path, hormone)
        })
        .collect()
}

/// Load the expression measurement file (decimal-comma variant).
///
/// Renames the raw expression column to the canonical `expression` field and
/// recodes the treatment marker exactly as the hormone loader does.
pub fn load_expression_table<P: AsRef<Path>>(path: P) -> Result<Vec<ExpressionRecord>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_path(path)?;

    let header = reader.headers()?.clone();
    let no3_idx = column_index(&header, NO3_COLUMN, path)?;
    let expr_idx = column_index(&header, EXPRESSION_COLUMN, path)?;
    let treatment_idx = column_index(&header, TREATMENT_COLUMN, path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(ExpressionRecord {
            no3: parse_comma_decimal(&row, no3_idx, NO3_COLUMN, path)?,
            treatment: Treatment::from_code(
                field(&row, treatment_idx, TREATMENT_COLUMN, path)?,
                &path.display().to_string(),
            )?,
            expression: parse_comma_decimal(&row, expr_idx, EXPRESSION_COLUMN, path)?,
        });
    }

    if records.is_empty() {
        return Err(CkError::EmptyData {
            reason: format!("no expression rows in {}", path.display()),
        });
    }

    info!(
        "loaded {} expression rows from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

fn column_index(header: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CkError::InvalidTable {
            reason: format!("column '{}' not found in {}", name, path.display()),
        })
}

fn field<'a>(row: &'a StringRecord, idx: usize, name: &str, path: &Path) -> Result<&'a str> {
    row.get(idx).ok_or_else(|| CkError::InvalidTable {
        reason: format!(
            "line {} in {} is missing column '{}'",
            row.position().map(|p| p.line()).unwrap_or(0),
            path.display(),
            name
        ),
    })
}

fn parse_point_decimal(row: &StringRecord, idx: usize, name: &str, path: &Path) -> Result<f64> {
    let raw = field(row, idx, name, path)?;
    raw.parse::<f64>().map_err(|_| CkError::InvalidTable {
        reason: format!(
            "invalid numeric value '{}' in column '{}' of {}",
            raw,
            name,
            path.display()
        ),
    })
}

fn parse_comma_decimal(row: &StringRecord, idx: usize, name: &str, path: &Path) -> Result<f64> {
    let raw = field(row, idx, name, path)?;
    raw.replace(',', ".")
        .parse::<f64>()
        .map_err(|_| CkError::InvalidTable {
            reason: format!(
                "invalid decimal-comma value '{}' in column '{}' of {}",
                raw,
                name,
                path.display()
            ),
        })
}
