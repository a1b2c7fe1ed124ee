//! Scatter-plot-with-regression rendering, bounded by a byte budget.

pub mod encode;
pub mod regression;

pub use regression::{paired_samples, RegressionFit};

use base64::{engine::general_purpose::STANDARD, Engine};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::config::ChartConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::table::NumericColumn;

/// Caller-supplied style for the fitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    DottedRed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Webp,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Webp => "image/webp",
        }
    }
}

/// Encoded chart bytes plus the MIME type they were actually encoded with.
/// `truncated` marks the corrupt last-resort output that merely fit the
/// budget; it must be surfaced, not celebrated.
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
    pub truncated: bool,
}

impl ChartImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), STANDARD.encode(&self.bytes))
    }
}

fn padded(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}

fn draw_svg(
    pairs: &[(f64, f64)],
    fit: &RegressionFit,
    x_label: &str,
    y_label: &str,
    style: LineStyle,
    width: u32,
    height: u32,
) -> ScoutResult<String> {
    let draw_err = |e: &dyn std::fmt::Display| ScoutError::render(format!("chart draw: {e}"));

    let x_min = pairs.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = pairs.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_lo = pairs
        .iter()
        .map(|p| p.1)
        .chain([fit.predict(x_min), fit.predict(x_max)])
        .fold(f64::INFINITY, f64::min);
    let y_hi = pairs
        .iter()
        .map(|p| p.1)
        .chain([fit.predict(x_min), fit.predict(x_max)])
        .fold(f64::NEG_INFINITY, f64::max);

    let (x_min, x_max) = padded(x_min, x_max);
    let (y_lo, y_hi) = padded(y_lo, y_hi);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_err(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(56)
            .build_cartesian_2d(x_min..x_max, y_lo..y_hi)
            .map_err(|e| draw_err(&e))?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(|e| draw_err(&e))?;

        chart
            .draw_series(pairs.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))
            .map_err(|e| draw_err(&e))?;

        let line = [(x_min, fit.predict(x_min)), (x_max, fit.predict(x_max))];
        match style {
            LineStyle::Solid => {
                chart
                    .draw_series(LineSeries::new(line, BLUE.stroke_width(2)))
                    .map_err(|e| draw_err(&e))?;
            }
            LineStyle::DottedRed => {
                chart
                    .draw_series(DashedLineSeries::new(
                        line,
                        4,
                        4,
                        ShapeStyle::from(&RED).stroke_width(2),
                    ))
                    .map_err(|e| draw_err(&e))?;
            }
        }

        root.present().map_err(|e| draw_err(&e))?;
    }
    Ok(svg)
}

/// Render a scatter of the valid (x, y) pairs with a least-squares line,
/// encoded under the configured byte budget.
///
/// Rows where either value is missing are dropped first; fewer than two
/// surviving pairs is an explicit insufficient-data error.
pub fn render(
    x: &NumericColumn,
    y: &NumericColumn,
    x_label: &str,
    y_label: &str,
    style: LineStyle,
    cfg: &ChartConfig,
) -> ScoutResult<ChartImage> {
    let pairs = paired_samples(x, y);
    let fit = RegressionFit::fit(&pairs)?;
    let svg = draw_svg(&pairs, &fit, x_label, y_label, style, cfg.base_width, cfg.base_height)?;
    encode::encode_bounded(&svg, cfg)
}
