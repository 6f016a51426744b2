//! Numeric extraction and line-chart rendering.
//!
//! Free text is scanned for numeric literals and capped at [`MAX_TEXT_POINTS`]
//! values. Tables contribute every value of each numeric column, uncapped.

use crate::error::{DecoderError, Result};
use crate::schema::{DocumentContent, Table};
use once_cell::sync::Lazy;
use plotters::prelude::*;
use regex::Regex;
use serde::Serialize;

/// Maximum number of values kept from a text scan.
pub const MAX_TEXT_POINTS: usize = 10;

/// Fewest points that make a meaningful line.
pub const MIN_CHART_POINTS: usize = 2;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 480;

// A literal must start the text or follow a non-word character, so digits
// inside identifiers like "Q4" are skipped.
static NUMERIC_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\W)(-?\d+(?:\.\d+)?)\b").expect("numeric token pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSeries {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub series: Vec<NumericSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Visualization {
    Chart(Chart),
    InsufficientData { title: String },
}

impl Visualization {
    pub fn title(&self) -> &str {
        match self {
            Visualization::Chart(chart) => &chart.title,
            Visualization::InsufficientData { title } => title,
        }
    }

    pub fn chart(&self) -> Option<&Chart> {
        match self {
            Visualization::Chart(chart) => Some(chart),
            Visualization::InsufficientData { .. } => None,
        }
    }
}

/// Every integer or decimal literal in `text`, in scan order.
pub fn scan_numeric_tokens(text: &str) -> Vec<f64> {
    NUMERIC_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|token| token.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect()
}

pub fn extract_text_series(label: impl Into<String>, text: &str) -> NumericSeries {
    let mut values = scan_numeric_tokens(text);
    values.truncate(MAX_TEXT_POINTS);
    NumericSeries {
        label: label.into(),
        values,
    }
}

/// One series per numeric column, values in row order with empty cells skipped.
pub fn extract_table_series(table: &Table) -> Vec<NumericSeries> {
    table
        .numeric_columns()
        .map(|column| NumericSeries {
            label: column.name.clone(),
            values: column.numbers().collect(),
        })
        .collect()
}

pub fn visualize(title: impl Into<String>, content: &DocumentContent) -> Visualization {
    let title = title.into();
    match content {
        DocumentContent::Text(text) => {
            let series = extract_text_series("Values", text);
            if series.values.len() < MIN_CHART_POINTS {
                Visualization::InsufficientData { title }
            } else {
                Visualization::Chart(Chart {
                    title,
                    series: vec![series],
                })
            }
        }
        DocumentContent::Table(table) => {
            let series = extract_table_series(table);
            if series.is_empty() {
                Visualization::InsufficientData { title }
            } else {
                Visualization::Chart(Chart { title, series })
            }
        }
    }
}

fn chart_error(e: impl std::fmt::Display) -> DecoderError {
    DecoderError::ChartError(e.to_string())
}

impl Chart {
    fn bounds(&self) -> Result<(f64, f64, f64)> {
        let longest = self.series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        let x_max = longest.saturating_sub(1).max(1) as f64;

        let (mut y_min, mut y_max) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 1.0;
        }
        let pad = if y_max > y_min {
            (y_max - y_min) * 0.05
        } else {
            y_min.abs().max(1.0) * 0.1
        };
        let (lo, hi) = (y_min - pad, y_max + pad);

        // plotters never finishes laying out an axis whose span overflows
        if !(hi - lo).is_finite() {
            return Err(DecoderError::ChartError(format!(
                "value range {}..{} is too wide to plot",
                y_min, y_max
            )));
        }

        Ok((x_max, lo, hi))
    }

    /// Index-vs-value line chart as an SVG document.
    pub fn render_svg(&self) -> Result<String> {
        let (x_max, y_min, y_max) = self.bounds()?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT))
                .into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&self.title, ("sans-serif", 24))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(0f64..x_max, y_min..y_max)
                .map_err(chart_error)?;

            chart
                .configure_mesh()
                .x_desc("Index")
                .y_desc("Value")
                .draw()
                .map_err(chart_error)?;

            for (idx, series) in self.series.iter().enumerate() {
                let color = Palette99::pick(idx).to_rgba();
                let points: Vec<(f64, f64)> = series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64, *v))
                    .collect();
                chart
                    .draw_series(LineSeries::new(points, &color))
                    .map_err(chart_error)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }
        Ok(svg)
    }
}
