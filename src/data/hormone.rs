//! Hormone and treatment enumerations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CkError, Result};

/// The six measured cytokinin variants, in panel order.
///
/// The order of `ALL` is the order files are loaded, models are fit, and
/// table columns are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hormone {
    /// cis-zeatin
    #[serde(rename = "CZ")]
    Cz,
    /// cis-zeatin riboside
    #[serde(rename = "CZr")]
    CzR,
    /// isopentenyladenine
    #[serde(rename = "IP")]
    Ip,
    /// isopentenyladenine riboside
    #[serde(rename = "IPr")]
    IpR,
    /// trans-zeatin
    #[serde(rename = "TZ")]
    Tz,
    /// trans-zeatin riboside
    #[serde(rename = "TZr")]
    TzR,
}

impl Hormone {
    /// All hormones in panel order
    pub const ALL: [Hormone; 6] = [
        Hormone::Cz,
        Hormone::CzR,
        Hormone::Ip,
        Hormone::IpR,
        Hormone::Tz,
        Hormone::TzR,
    ];

    /// Short label used in tables, plot titles, and CSV file stems
    pub fn as_str(&self) -> &'static str {
        match self {
            Hormone::Cz => "CZ",
            Hormone::CzR => "CZr",
            Hormone::Ip => "IP",
            Hormone::IpR => "IPr",
            Hormone::Tz => "TZ",
            Hormone::TzR => "TZr",
        }
    }

    /// File stem of the measurement CSV for this hormone
    pub fn file_stem(&self) -> &'static str {
        self.as_str()
    }

    /// Minimum y-axis top for this hormone's scatter plot, in pmol/g FW.
    ///
    /// The zeatin pair ranges higher than the other four variants and gets
    /// the taller axis. The plot may raise the top further so the fitted
    /// band is never clipped.
    pub fn axis_ceiling(&self) -> f64 {
        match self {
            Hormone::Cz | Hormone::CzR => 20.0,
            _ => 6.0,
        }
    }
}

impl fmt::Display for Hormone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The binary elicitor treatment.
///
/// Raw files mark treatment with `-` (mock control) or `+` (LCO applied);
/// everything downstream works with the recoded labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Treatment {
    Mock,
    #[serde(rename = "LCO")]
    Lco,
}

impl Treatment {
    /// Both treatment levels, reference level first
    pub const ALL: [Treatment; 2] = [Treatment::Mock, Treatment::Lco];

    /// Recode the raw file marker into a treatment level
    pub fn from_code(code: &str, path: &str) -> Result<Self> {
        match code.trim() {
            "-" => Ok(Treatment::Mock),
            "+" => Ok(Treatment::Lco),
            other => Err(CkError::UnknownTreatment {
                code: other.to_string(),
                path: path.to_string(),
            }),
        }
    }

    /// Canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Treatment::Mock => "Mock",
            Treatment::Lco => "LCO",
        }
    }

    /// Design-matrix indicator: 0 for the mock reference, 1 for LCO
    pub fn indicator(&self) -> f64 {
        match self {
            Treatment::Mock => 0.0,
            Treatment::Lco => 1.0,
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_order() {
        let labels: Vec<&str> = Hormone::ALL.iter().map(|h| h.as_str()).collect();
        assert_eq!(labels, vec!["CZ", "CZr", "IP", "IPr", "TZ", "TZr"]);
    }

    #[test]
    fn test_treatment_recoding() {
        assert_eq!(Treatment::from_code("-", "x.csv").unwrap(), Treatment::Mock);
        assert_eq!(Treatment::from_code("+", "x.csv").unwrap(), Treatment::Lco);
        assert_eq!(Treatment::from_code(" + ", "x.csv").unwrap(), Treatment::Lco);
        assert!(Treatment::from_code("LCO", "x.csv").is_err());
        assert!(Treatment::from_code("", "x.csv").is_err());
    }

    #[test]
    fn test_treatment_labels() {
        assert_eq!(Treatment::Mock.as_str(), "Mock");
        assert_eq!(Treatment::Lco.as_str(), "LCO");
        assert_eq!(Treatment::Mock.indicator(), 0.0);
        assert_eq!(Treatment::Lco.indicator(), 1.0);
    }

    #[test]
    fn test_axis_ceilings() {
        assert!(Hormone::Cz.axis_ceiling() > Hormone::Ip.axis_ceiling());
        assert_eq!(Hormone::CzR.axis_ceiling(), Hormone::Cz.axis_ceiling());
    }
}
