//! Measurement record types

use serde::{Deserialize, Serialize};

use super::hormone::{Hormone, Treatment};
use crate::error::{CkError, Result};

/// One hormone concentration measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HormoneRecord {
    /// Which cytokinin variant this row belongs to
    pub hormone: Hormone,
    /// Nitrate concentration of the growth medium, mM
    pub no3: f64,
    /// Elicitor treatment
    pub treatment: Treatment,
    /// Measured concentration, pmol/g fresh weight
    pub conc: f64,
}

/// One gene expression measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRecord {
    /// Nitrate concentration of the growth medium, mM
    pub no3: f64,
    /// Elicitor treatment
    pub treatment: Treatment,
    /// Relative expression level
    pub expression: f64,
}

/// All measurements for a single hormone, in file row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HormoneTable {
    hormone: Hormone,
    records: Vec<HormoneRecord>,
}

impl HormoneTable {
    /// Create a table, verifying every record carries the right hormone tag
    pub fn new(hormone: Hormone, records: Vec<HormoneRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(CkError::EmptyData {
                reason: format!("no measurements for hormone {}", hormone),
            });
        }
        if let Some(stray) = records.iter().find(|r| r.hormone != hormone) {
            return Err(CkError::InvalidTable {
                reason: format!(
                    "record tagged {} in table for {}",
                    stray.hormone, hormone
                ),
            });
        }
        Ok(Self { hormone, records })
    }

    pub fn hormone(&self) -> Hormone {
        self.hormone
    }

    pub fn records(&self) -> &[HormoneRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows belonging to one treatment level, preserving order
    pub fn records_for(&self, treatment: Treatment) -> Vec<&HormoneRecord> {
        self.records
            .iter()
            .filter(|r| r.treatment == treatment)
            .collect()
    }

    /// Observed nitrate range (min, max)
    pub fn no3_range(&self) -> (f64, f64) {
        value_range(self.records.iter().map(|r| r.no3))
    }
}

/// Observed nitrate range of an expression dataset (min, max)
pub fn expression_no3_range(records: &[ExpressionRecord]) -> (f64, f64) {
    value_range(records.iter().map(|r| r.no3))
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hormone: Hormone, no3: f64, treatment: Treatment, conc: f64) -> HormoneRecord {
        HormoneRecord {
            hormone,
            no3,
            treatment,
            conc,
        }
    }

    #[test]
    fn test_table_rejects_mixed_tags() {
        let rows = vec![
            record(Hormone::Cz, 0.0, Treatment::Mock, 1.0),
            record(Hormone::Ip, 1.0, Treatment::Lco, 2.0),
        ];
        assert!(HormoneTable::new(Hormone::Cz, rows).is_err());
    }

    #[test]
    fn test_table_rejects_empty() {
        assert!(HormoneTable::new(Hormone::Cz, vec![]).is_err());
    }

    #[test]
    fn test_records_for_preserves_order() {
        let rows = vec![
            record(Hormone::Tz, 0.0, Treatment::Mock, 1.0),
            record(Hormone::Tz, 1.0, Treatment::Lco, 2.0),
            record(Hormone::Tz, 2.0, Treatment::Mock, 3.0),
        ];
        let table = HormoneTable::new(Hormone::Tz, rows).unwrap();
        let mock: Vec<f64> = table
            .records_for(Treatment::Mock)
            .iter()
            .map(|r| r.conc)
            .collect();
        assert_eq!(mock, vec![1.0, 3.0]);
    }

    #[test]
    fn test_no3_range() {
        let rows = vec![
            record(Hormone::Tz, 4.0, Treatment::Mock, 1.0),
            record(Hormone::Tz, 0.0, Treatment::Lco, 2.0),
            record(Hormone::Tz, 16.0, Treatment::Mock, 3.0),
        ];
        let table = HormoneTable::new(Hormone::Tz, rows).unwrap();
        assert_eq!(table.no3_range(), (0.0, 16.0));
    }
}
