//! Plot rendering for the hormone panel and the expression fit

use std::ops::Range;
use std::path::Path;

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint};
use plotters::prelude::*;

use crate::data::{ExpressionRecord, HormoneTable, Treatment};
use crate::error::{CkError, Result};
use crate::model::{PredictionPoint, TrendBand};

/// Wraps the (unnameable) `WithKeyPoints<RangedCoordf64>` type returned by
/// `with_key_points()` so it reports `DefaultFormatting` instead of
/// inheriting `RangedCoordf64`'s `NoDefaultFormatting`. The plot always
/// supplies an explicit `x_label_formatter`, so the formatter this unlocks
/// via the blanket `ValueFormatter` impl is never actually used.
struct DoseAxis<R>(R);

impl<R: Ranged<ValueType = f64>> Ranged for DoseAxis<R> {
    type ValueType = f64;
    type FormatOption = DefaultFormatting;

    fn range(&self) -> Range<f64> {
        self.0.range()
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

/// The nominal dose series, used as fixed x-axis ticks
const DOSE_TICKS: [f64; 6] = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0];

/// Half-width multiplier of the expression ribbon (95% of a normal)
const RIBBON_Z: f64 = 1.96;

const PLOT_SIZE: (u32, u32) = (900, 600);

fn draw_err(e: impl std::fmt::Display) -> CkError {
    CkError::PlotFailed {
        reason: e.to_string(),
    }
}

fn treatment_color(treatment: Treatment) -> RGBColor {
    match treatment {
        Treatment::Mock => BLUE,
        Treatment::Lco => RED,
    }
}

/// Scatter of one hormone's measurements with per-treatment trend lines
/// and confidence bands.
///
/// The y-axis top starts at the hormone's ceiling and grows if the data or
/// a band would be clipped; x ticks sit on the nominal dose series.
pub fn plot_hormone<P: AsRef<Path>>(
    table: &HormoneTable,
    bands: &[TrendBand],
    path: P,
) -> Result<()> {
    let hormone = table.hormone();

    let data_max = table
        .records()
        .iter()
        .map(|r| r.conc)
        .fold(0.0f64, f64::max);
    let band_max = bands
        .iter()
        .flat_map(|b| b.upper.iter().copied())
        .fold(0.0f64, f64::max);
    let y_max = hormone
        .axis_ceiling()
        .max(1.05 * data_max)
        .max(1.05 * band_max);

    let root = BitMapBackend::new(path.as_ref(), PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let x_range = DoseAxis((-0.5f64..16.5f64).with_key_points(DOSE_TICKS.to_vec()));
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{hormone} vs NO3"), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0.0f64..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("NO3 (mM)")
        .y_desc(format!("{hormone} (pmol/g FW)"))
        .x_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(draw_err)?;

    for band in bands {
        let color = treatment_color(band.treatment);

        // Confidence band as a closed polygon: upper path out, lower back
        let mut ribbon: Vec<(f64, f64)> = band
            .no3
            .iter()
            .zip(&band.upper)
            .map(|(&x, &y)| (x, y))
            .collect();
        ribbon.extend(
            band.no3
                .iter()
                .zip(&band.lower)
                .rev()
                .map(|(&x, &y)| (x, y)),
        );
        chart
            .draw_series(std::iter::once(Polygon::new(ribbon, color.mix(0.15).filled())))
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                band.no3.iter().zip(&band.fit).map(|(&x, &y)| (x, y)),
                color.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label(band.treatment.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    for &treatment in &Treatment::ALL {
        let color = treatment_color(treatment);
        let points = table.records_for(treatment);
        match treatment {
            Treatment::Mock => {
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|r| Circle::new((r.no3, r.conc), 4, color.filled())),
                    )
                    .map_err(draw_err)?;
            }
            Treatment::Lco => {
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|r| TriangleMarker::new((r.no3, r.conc), 5, color.filled())),
                    )
                    .map_err(draw_err)?;
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Scatter of expression measurements with the winning model's prediction
/// curve and standard-error ribbon per treatment.
pub fn plot_expression<P: AsRef<Path>>(
    records: &[ExpressionRecord],
    curve: &[PredictionPoint],
    path: P,
) -> Result<()> {
    let (x_lo, x_hi) = crate::data::expression_no3_range(records);

    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;
    for r in records {
        y_lo = y_lo.min(r.expression);
        y_hi = y_hi.max(r.expression);
    }
    for p in curve {
        y_lo = y_lo.min(p.fit - RIBBON_Z * p.se);
        y_hi = y_hi.max(p.fit + RIBBON_Z * p.se);
    }
    let pad = 0.05 * (y_hi - y_lo).max(1e-6);

    let root = BitMapBackend::new(path.as_ref(), PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("NIN expression vs NO3", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (x_lo - 0.5)..(x_hi + 0.5),
            (y_lo - pad)..(y_hi + pad),
        )
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("NO3 (mM)")
        .y_desc("NIN relative expression")
        .draw()
        .map_err(draw_err)?;

    for &treatment in &Treatment::ALL {
        let color = treatment_color(treatment);
        let segment: Vec<&PredictionPoint> = curve
            .iter()
            .filter(|p| p.treatment == treatment)
            .collect();
        if segment.is_empty() {
            continue;
        }

        let mut ribbon: Vec<(f64, f64)> = segment
            .iter()
            .map(|p| (p.no3, p.fit + RIBBON_Z * p.se))
            .collect();
        ribbon.extend(
            segment
                .iter()
                .rev()
                .map(|p| (p.no3, p.fit - RIBBON_Z * p.se)),
        );
        chart
            .draw_series(std::iter::once(Polygon::new(ribbon, color.mix(0.15).filled())))
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                segment.iter().map(|p| (p.no3, p.fit)),
                color.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label(treatment.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    for r in records {
        let color = treatment_color(r.treatment);
        match r.treatment {
            Treatment::Mock => {
                chart
                    .draw_series(std::iter::once(Circle::new(
                        (r.no3, r.expression),
                        4,
                        color.filled(),
                    )))
                    .map_err(draw_err)?;
            }
            Treatment::Lco => {
                chart
                    .draw_series(std::iter::once(TriangleMarker::new(
                        (r.no3, r.expression),
                        5,
                        color.filled(),
                    )))
                    .map_err(draw_err)?;
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}
