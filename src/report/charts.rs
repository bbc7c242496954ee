//! PNG chart rendering.
//!
//! Each chart reads the cleaned table, computes its grouped aggregate and
//! writes one file into the output directory, replacing any previous file
//! of the same name.

use crate::analysis::{
    histogram_bins, mean_by_state, mean_by_year, present_values, top_values, HistogramBins,
    StateMean, YearlyMean,
};
use crate::error::{PipelineError, Result};
use crate::ingest::YEAR_COLUMN;
use crate::frame::has_column;
use crate::transform::{AVG_BOD, AVG_DO, AVG_PH};
use plotters::prelude::*;
use polars::prelude::DataFrame;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PH_TREND_FILE: &str = "avg_ph_trend.png";
pub const PARAMETER_TRENDS_FILE: &str = "parameter_trends.png";
pub const STATE_COMPARISON_FILE: &str = "state_ph_comparison.png";
pub const BOD_DISTRIBUTION_FILE: &str = "bod_distribution.png";

/// Optional grouping column for the state comparison chart.
pub const STATE_COLUMN: &str = "state_name";

/// Labeled series drawn on the multi-parameter trend chart.
pub const TREND_PARAMETERS: [(&str, &str); 3] = [("pH", AVG_PH), ("DO", AVG_DO), ("BOD", AVG_BOD)];

const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const SERIES_COLORS: [RGBColor; 3] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
];
const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Chart tuning.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Number of bins in the BOD histogram.
    pub histogram_bins: usize,
    /// How many of the most frequent states to compare.
    pub top_states: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            top_states: 5,
        }
    }
}

/// Renders the fixed chart set into one output directory.
pub struct ChartRenderer {
    output_dir: PathBuf,
    options: ChartOptions,
}

impl ChartRenderer {
    /// Create a renderer. Registers the bundled font with the text backend.
    pub fn new(output_dir: impl Into<PathBuf>, options: ChartOptions) -> Result<Self> {
        plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
            .map_err(|_| PipelineError::render("font", "bundled font could not be parsed"))?;

        Ok(Self {
            output_dir: output_dir.into(),
            options,
        })
    }

    /// Render every applicable chart, returning the files written.
    pub fn render_all(&self, df: &DataFrame) -> Result<Vec<PathBuf>> {
        let mut written = vec![
            self.render_ph_trend(df)?,
            self.render_parameter_trends(df)?,
        ];
        if let Some(path) = self.render_state_comparison(df)? {
            written.push(path);
        }
        written.push(self.render_bod_distribution(df)?);

        Ok(written)
    }

    /// Yearly mean pH as a line with markers.
    pub fn render_ph_trend(&self, df: &DataFrame) -> Result<PathBuf> {
        let trend = mean_by_year(df, YEAR_COLUMN, AVG_PH)?;
        let path = self.prepare(PH_TREND_FILE)?;

        let title = format!("Average pH Trend{}", year_span(&trend));
        draw_trends(&path, (800, 500), &title, "Average pH", &[("pH", trend)], false)
            .map_err(|e| PipelineError::render(PH_TREND_FILE, e))?;

        info!("Saved {}", path.display());
        Ok(path)
    }

    /// Yearly means of pH, DO and BOD on one chart with a legend.
    pub fn render_parameter_trends(&self, df: &DataFrame) -> Result<PathBuf> {
        let mut series = Vec::with_capacity(TREND_PARAMETERS.len());
        for (label, column) in TREND_PARAMETERS {
            series.push((label, mean_by_year(df, YEAR_COLUMN, column)?));
        }
        let path = self.prepare(PARAMETER_TRENDS_FILE)?;

        let all: Vec<YearlyMean> = series.iter().flat_map(|(_, s)| s.clone()).collect();
        let title = format!("Water Quality Parameters Trend{}", year_span(&all));
        draw_trends(&path, (900, 500), &title, "Average Value", &series, true)
            .map_err(|e| PipelineError::render(PARAMETER_TRENDS_FILE, e))?;

        info!("Saved {}", path.display());
        Ok(path)
    }

    /// Mean pH of the most frequent states. `None` when there is no state column.
    pub fn render_state_comparison(&self, df: &DataFrame) -> Result<Option<PathBuf>> {
        if !has_column(df, STATE_COLUMN) {
            info!("No '{}' column, skipping state comparison", STATE_COLUMN);
            return Ok(None);
        }

        let states = top_values(df, STATE_COLUMN, self.options.top_states)?;
        debug!("Top states: {:?}", states);
        let means = mean_by_state(df, STATE_COLUMN, AVG_PH, &states)?;
        let path = self.prepare(STATE_COMPARISON_FILE)?;

        let title = format!("Average pH of Top {} States", self.options.top_states);
        draw_state_bars(&path, (800, 500), &title, &means)
            .map_err(|e| PipelineError::render(STATE_COMPARISON_FILE, e))?;

        info!("Saved {}", path.display());
        Ok(Some(path))
    }

    /// Histogram of average BOD. Writes a blank chart when there are no values.
    pub fn render_bod_distribution(&self, df: &DataFrame) -> Result<PathBuf> {
        let values = present_values(df, AVG_BOD)?;
        let bins = histogram_bins(&values, self.options.histogram_bins);
        let path = self.prepare(BOD_DISTRIBUTION_FILE)?;

        draw_histogram(
            &path,
            (700, 500),
            "Distribution of Biochemical Oxygen Demand (BOD)",
            &bins,
        )
        .map_err(|e| PipelineError::render(BOD_DISTRIBUTION_FILE, e))?;

        info!("Saved {} ({} values)", path.display(), values.len());
        Ok(path)
    }

    /// Make sure the output directory exists and return the chart path.
    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| PipelineError::io(&self.output_dir, e))?;
        Ok(self.output_dir.join(file_name))
    }
}

fn year_span(points: &[YearlyMean]) -> String {
    let first = points.iter().map(|p| p.year).min();
    let last = points.iter().map(|p| p.year).max();
    match (first, last) {
        (Some(a), Some(b)) if a != b => format!(" ({}–{})", a, b),
        (Some(a), _) => format!(" ({})", a),
        _ => String::new(),
    }
}

/// Value range padded by 10% on both sides.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.1 } else { 1.0 };
    (min - pad, max + pad)
}

fn draw_trends(
    path: &Path,
    size: (u32, u32),
    title: &str,
    y_desc: &str,
    series: &[(&str, Vec<YearlyMean>)],
    with_legend: bool,
) -> DrawResult {
    let years = series.iter().flat_map(|(_, s)| s.iter().map(|p| p.year));
    let first = years.clone().min().unwrap_or(0);
    let last = years.max().unwrap_or(first);
    let (y_min, y_max) = padded_range(series.iter().flat_map(|(_, s)| s.iter().map(|p| p.mean)));

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d((first - 1)..(last + 1), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(y_desc)
        .x_labels((last - first + 3).clamp(2, 20) as usize)
        .draw()?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        let coords: Vec<(i64, f64)> = points.iter().map(|p| (p.year, p.mean)).collect();

        chart
            .draw_series(LineSeries::new(coords.clone(), color.stroke_width(2)))?
            .label(*label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        chart.draw_series(
            coords
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
        )?;
    }

    if with_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_state_bars(path: &Path, size: (u32, u32), title: &str, means: &[StateMean]) -> DrawResult {
    let n_bars = means.len().max(1) as u32;
    let (_, y_top) = padded_range(means.iter().map(|m| m.mean));
    let y_top = y_top.max(1.0);

    let names: Vec<String> = means.iter().map(|m| m.state.clone()).collect();
    let label_for = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            names.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 22))
        .margin(15)
        .x_label_area_size(110)
        .y_label_area_size(55)
        .build_cartesian_2d((0u32..n_bars).into_segmented(), 0.0..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("State")
        .y_desc("Average pH")
        .x_labels(n_bars as usize)
        .x_label_formatter(&label_for)
        .x_label_style(
            (FONT_FAMILY, 13)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(12)
            .data(means.iter().enumerate().map(|(i, m)| (i as u32, m.mean))),
    )?;

    root.present()?;
    Ok(())
}

fn draw_histogram(path: &Path, size: (u32, u32), title: &str, bins: &HistogramBins) -> DrawResult {
    let x_min = bins.edges.first().copied().unwrap_or(0.0);
    let x_max = bins.edges.last().copied().unwrap_or(1.0);
    if !(x_max - x_min).is_finite() || x_max <= x_min {
        return Err(format!("BOD range {x_min:e}..{x_max:e} cannot be drawn").into());
    }
    let top = bins.counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT_FAMILY, 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..top)?;

    chart
        .configure_mesh()
        .x_desc("BOD (mg/L)")
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(
        bins.edges
            .windows(2)
            .zip(&bins.counts)
            .filter(|(_, count)| **count > 0)
            .map(|(edge, count)| {
                Rectangle::new([(edge[0], 0.0), (edge[1], *count as f64)], SKY_BLUE.filled())
            }),
    )?;

    root.present()?;
    Ok(())
}
