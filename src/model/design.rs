//! Design matrix construction for the hormone linear models

use ndarray::{Array1, Array2};

use crate::data::{HormoneRecord, HormoneTable, Treatment};
use crate::error::{CkError, Result};

/// Coefficient names of the interaction model, in column order
pub const COEF_NAMES: [&str; 4] = ["Intercept", "NO3", "LCO", "NO3:LCO"];

/// One design row of the interaction model for a given input point
pub fn interaction_row(no3: f64, treatment: Treatment) -> [f64; 4] {
    let lco = treatment.indicator();
    [1.0, no3, lco, no3 * lco]
}

/// Build the full interaction design `[1, no3, lco, no3*lco]` and the
/// response vector for one hormone's measurements.
///
/// Treatment contrasts use Mock as the reference level, so the intercept is
/// the mock baseline at 0 mM nitrate and `LCO` is the treatment offset.
pub fn interaction_design(table: &HormoneTable) -> Result<(Array2<f64>, Array1<f64>)> {
    let records = table.records();
    if records.is_empty() {
        return Err(CkError::EmptyData {
            reason: format!("no rows to fit for {}", table.hormone()),
        });
    }

    let n = records.len();
    let mut design = Array2::zeros((n, COEF_NAMES.len()));
    let mut response = Array1::zeros(n);
    for (i, record) in records.iter().enumerate() {
        let row = interaction_row(record.no3, record.treatment);
        for (j, &value) in row.iter().enumerate() {
            design[[i, j]] = value;
        }
        response[i] = record.conc;
    }

    Ok((design, response))
}

/// Build the simple `[1, no3]` design for a per-treatment trend line.
pub fn trend_design(records: &[&HormoneRecord]) -> (Array2<f64>, Array1<f64>) {
    let n = records.len();
    let mut design = Array2::zeros((n, 2));
    let mut response = Array1::zeros(n);
    for (i, record) in records.iter().enumerate() {
        design[[i, 0]] = 1.0;
        design[[i, 1]] = record.no3;
        response[i] = record.conc;
    }
    (design, response)
}

/// Indices of design columns with no variation across rows (other than the
/// intercept). Fits still proceed on such designs; callers log the columns
/// so a degenerate dose series is visible in the run output.
pub fn constant_columns(design: &Array2<f64>) -> Vec<usize> {
    let (n, p) = design.dim();
    if n == 0 {
        return Vec::new();
    }
    (1..p)
        .filter(|&j| {
            let first = design[[0, j]];
            (1..n).all(|i| design[[i, j]] == first)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Hormone;

    fn table(rows: &[(f64, Treatment, f64)]) -> HormoneTable {
        let records = rows
            .iter()
            .map(|&(no3, treatment, conc)| HormoneRecord {
                hormone: Hormone::Cz,
                no3,
                treatment,
                conc,
            })
            .collect();
        HormoneTable::new(Hormone::Cz, records).unwrap()
    }

    #[test]
    fn test_interaction_rows() {
        assert_eq!(interaction_row(4.0, Treatment::Mock), [1.0, 4.0, 0.0, 0.0]);
        assert_eq!(interaction_row(4.0, Treatment::Lco), [1.0, 4.0, 1.0, 4.0]);
    }

    #[test]
    fn test_interaction_design_shape() {
        let t = table(&[
            (0.0, Treatment::Mock, 0.5),
            (2.0, Treatment::Lco, 0.9),
            (16.0, Treatment::Mock, 1.4),
        ]);
        let (design, response) = interaction_design(&t).unwrap();
        assert_eq!(design.dim(), (3, 4));
        assert_eq!(response.len(), 3);
        // LCO row carries the interaction term
        assert_eq!(design[[1, 2]], 1.0);
        assert_eq!(design[[1, 3]], 2.0);
        // Mock rows do not
        assert_eq!(design[[2, 2]], 0.0);
        assert_eq!(design[[2, 3]], 0.0);
    }

    #[test]
    fn test_constant_columns_flags_degenerate_dose() {
        let t = table(&[
            (0.0, Treatment::Mock, 0.1),
            (0.0, Treatment::Lco, 0.5),
            (0.0, Treatment::Mock, 0.1),
        ]);
        let (design, _) = interaction_design(&t).unwrap();
        let constant = constant_columns(&design);
        // NO3 column never varies; the interaction column does (0 vs 0) --
        // all rows have no3 = 0 so it is constant too.
        assert!(constant.contains(&1));
        assert!(constant.contains(&3));
        assert!(!constant.contains(&2));
    }
}
