//! Rendered summary tables

use std::fs::File;
use std::io::Write;
use std::path::Path;

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Row, Table};

use crate::error::Result;
use crate::model::{GamComparison, LinearFit, COEF_NAMES};

/// Combined coefficient table: one row per model term, one column per
/// hormone, cells showing the estimate, its confidence interval, and the
/// significance marker.
pub fn coefficient_table(fits: &[LinearFit]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Term")];
    for fit in fits {
        header.push(Cell::new(fit.hormone.as_str()));
    }
    table.set_header(header);

    for (row_idx, term) in COEF_NAMES.iter().enumerate() {
        let mut row = Row::new();
        row.add_cell(Cell::new(term));
        for fit in fits {
            let coef = &fit.coefficients[row_idx];
            row.add_cell(Cell::new(format!(
                "{:.3} [{:.3}, {:.3}] {}",
                coef.estimate, coef.ci_low, coef.ci_high, coef.stars()
            )));
        }
        table.add_row(row);
    }

    table
}

/// AIC ranking of the four expression models, best first.
pub fn aic_table(comparison: &GamComparison) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Model", "EDF", "AIC", "dAIC", "Best"]);

    let mut order: Vec<usize> = (0..comparison.fits.len()).collect();
    order.sort_by(|&a, &b| {
        comparison.fits[a]
            .aic
            .partial_cmp(&comparison.fits[b].aic)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for i in order {
        let fit = &comparison.fits[i];
        table.add_row(Row::from(vec![
            Cell::new(fit.spec.label()),
            Cell::new(format!("{:.2}", fit.edf)),
            Cell::new(format!("{:.2}", fit.aic)),
            Cell::new(format!("{:.2}", comparison.delta_aic(i))),
            Cell::new(if i == comparison.best { "*" } else { "" }),
        ]));
    }

    table
}

/// Write both tables into a plain-text report file.
pub fn write_report<P: AsRef<Path>>(
    path: P,
    coefficients: &Table,
    aic: &Table,
) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "Hormone interaction models (conc ~ NO3 * LCO)")?;
    writeln!(file, "{coefficients}")?;
    writeln!(file)?;
    writeln!(file, "Expression model comparison (AIC, lower is better)")?;
    writeln!(file, "{aic}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Hormone, HormoneRecord, HormoneTable, Treatment};
    use crate::model::{compare_expression_models, fit_hormone_panel};
    use crate::data::ExpressionRecord;

    fn panel() -> Vec<HormoneTable> {
        Hormone::ALL
            .iter()
            .map(|&hormone| {
                let records = (0..12)
                    .map(|i| {
                        let no3 = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0][i % 6];
                        let treatment =
                            if i < 6 { Treatment::Mock } else { Treatment::Lco };
                        HormoneRecord {
                            hormone,
                            no3,
                            treatment,
                            conc: 0.5 + 0.1 * no3 + ((i * 7 % 5) as f64) * 1e-3,
                        }
                    })
                    .collect();
                HormoneTable::new(hormone, records).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_coefficient_table_shape() {
        let fits = fit_hormone_panel(&panel(), 0.95).unwrap();
        let table = coefficient_table(&fits);

        // 4 coefficient rows
        assert_eq!(table.row_iter().count(), 4);
        let rendered = table.to_string();
        // One column per hormone, in panel order
        for label in ["CZ", "CZr", "IP", "IPr", "TZ", "TZr"] {
            assert!(rendered.contains(label), "missing column {}", label);
        }
        let cz = rendered.find(" CZ ").unwrap();
        let tzr = rendered.find("TZr").unwrap();
        assert!(cz < tzr);
        for term in COEF_NAMES {
            assert!(rendered.contains(term), "missing term {}", term);
        }
    }

    #[test]
    fn test_aic_table_marks_best_first() {
        let records: Vec<ExpressionRecord> = (0..=32)
            .flat_map(|step| {
                let no3 = step as f64 * 0.5;
                Treatment::ALL.into_iter().map(move |treatment| ExpressionRecord {
                    no3,
                    treatment,
                    expression: 2.0 + ((step * 3 % 7) as f64) * 1e-3,
                })
            })
            .collect();

        let comparison = compare_expression_models(&records).unwrap();
        let table = aic_table(&comparison);
        assert_eq!(table.row_iter().count(), 4);

        let rendered = table.to_string();
        // Best row carries the marker and a zero AIC distance
        assert!(rendered.contains('*'));
        assert!(rendered.contains("0.00"));
    }
}
