//! Static Chart Renderer
//! Draws planned charts to PNG files with plotters and writes a JSON manifest.
//!
//! Chart kinds:
//! 1. Category counts: one bar per category
//! 2. Grouped counts: one bar per (category, hue) with a legend
//! 3. Summary bars: field means with standard deviation error bars
//! 4. Category means: joined points with confidence interval bars
//! 5. Time series: line + points over row positions, vertical event markers

use super::plan::{ChartBody, ChartSpec, ErrorBarPoint, Rgb, SeriesPoint, BAR_COLOR, PALETTE};
use crate::stats::{CategoryMean, EventMarker, GroupedCounts};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the manifest written next to the images.
pub const MANIFEST_FILE: &str = "charts.json";

const CAPTION_FONT: (&str, u32) = ("sans-serif", 22);

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart '{chart}': {message}")]
    Draw { chart: String, message: String },
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize chart manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Renders chart descriptions into an output directory.
pub struct ChartRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            output_dir: output_dir.into(),
            size,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the `index`-th (0-based) chart image.
    pub fn image_path(&self, index: usize, chart: &ChartSpec) -> PathBuf {
        self.output_dir
            .join(format!("{:02}-{}.png", index + 1, chart.slug()))
    }

    /// Render every chart and the manifest; returns the image paths in chart order.
    pub fn render_all(&self, charts: &[ChartSpec]) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| RenderError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(charts.len());
        for (i, chart) in charts.iter().enumerate() {
            let path = self.image_path(i, chart);
            self.render(chart, &path).map_err(|e| RenderError::Draw {
                chart: chart.title.clone(),
                message: e.to_string(),
            })?;
            debug!("rendered '{}' -> {}", chart.title, path.display());
            written.push(path);
        }

        self.write_manifest(charts)?;
        info!(
            "wrote {} charts to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }

    /// Write the chart descriptions as pretty JSON.
    pub fn write_manifest(&self, charts: &[ChartSpec]) -> Result<PathBuf, RenderError> {
        let path = self.output_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(charts)?;
        fs::write(&path, json).map_err(|source| RenderError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Open images with the system viewer. Viewer failures are logged only.
    pub fn show(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = open::that(path) {
                warn!("could not open {}: {}", path.display(), e);
            }
        }
    }

    fn render(&self, chart: &ChartSpec, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        match &chart.body {
            ChartBody::CategoryCounts { axis, bars } => {
                Self::draw_category_counts(&root, &chart.title, axis, bars)?
            }
            ChartBody::GroupedCounts { axis, hue, counts } => {
                Self::draw_grouped_counts(&root, &chart.title, axis, hue, counts)?
            }
            ChartBody::SummaryBars { bars, color } => {
                Self::draw_summary_bars(&root, &chart.title, bars, *color)?
            }
            ChartBody::CategoryMeans {
                axis,
                value,
                points,
            } => Self::draw_category_means(&root, &chart.title, axis, value, points)?,
            ChartBody::TimeSeries {
                x_axis,
                y_axis,
                points,
                x_window,
                markers,
                color,
            } => Self::draw_time_series(
                &root,
                &chart.title,
                (x_axis, y_axis),
                points,
                *x_window,
                markers,
                *color,
            )?,
        }

        root.present()?;
        Ok(())
    }

    fn draw_category_counts(
        root: &Area,
        title: &str,
        axis: &str,
        bars: &[(String, usize)],
    ) -> DrawResult {
        let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();
        let values: Vec<f64> = bars.iter().map(|(_, n)| *n as f64).collect();
        Self::draw_bars(root, title, (axis, "count"), &labels, &values, None, rgb(BAR_COLOR))
    }

    fn draw_summary_bars(root: &Area, title: &str, bars: &[ErrorBarPoint], color: Rgb) -> DrawResult {
        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        let errors: Vec<f64> = bars.iter().map(|b| b.error).collect();
        Self::draw_bars(root, title, ("", ""), &labels, &values, Some(&errors), rgb(color))
    }

    /// Bars over a segmented x axis, optionally with symmetric error bars.
    fn draw_bars(
        root: &Area,
        title: &str,
        (x_desc, y_desc): (&str, &str),
        labels: &[String],
        values: &[f64],
        errors: Option<&[f64]>,
        color: RGBColor,
    ) -> DrawResult {
        let n = labels.len().max(1);
        let error_at = |i: usize| {
            errors
                .and_then(|e| e.get(i).copied())
                .filter(|e| e.is_finite())
                .unwrap_or(0.0)
        };

        let extents = values
            .iter()
            .enumerate()
            .flat_map(|(i, v)| [v - error_at(i), v + error_at(i)]);
        let (y_lo, y_hi) = padded_range(extents, true);

        let mut chart = ChartBuilder::on(root)
            .caption(title, CAPTION_FONT)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), y_lo..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| segment_label(labels, x))
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, v)| {
                    let mut bar = Rectangle::new(
                        [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                        color.filled(),
                    );
                    bar.set_margin(0, 0, 10, 10);
                    bar
                }),
        )?;

        if errors.is_some() {
            chart.draw_series(
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, v)| {
                        let e = error_at(i);
                        ErrorBar::new_vertical(
                            SegmentValue::CenterOf(i),
                            v - e,
                            *v,
                            v + e,
                            BLACK.stroke_width(2),
                            12,
                        )
                    }),
            )?;
        }

        Ok(())
    }

    /// Side-by-side bars per category; each category owns `hues + 1` segments,
    /// the last one left empty as a gap.
    fn draw_grouped_counts(
        root: &Area,
        title: &str,
        axis: &str,
        hue: &str,
        counts: &GroupedCounts,
    ) -> DrawResult {
        let stride = counts.hues.len() + 1;
        let total = (counts.categories.len() * stride).max(1);
        let label_slot = counts.hues.len() / 2;

        let labels: Vec<String> = (0..total)
            .map(|j| {
                if j % stride == label_slot {
                    counts.categories.get(j / stride).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .collect();

        let max_count = counts.counts.iter().flatten().copied().max().unwrap_or(0);
        let (y_lo, y_hi) = padded_range([max_count as f64], true);

        let mut chart = ChartBuilder::on(root)
            .caption(title, CAPTION_FONT)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..total).into_segmented(), y_lo..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(total)
            .x_label_formatter(&|x| segment_label(&labels, x))
            .x_desc(axis)
            .y_desc("count")
            .draw()?;

        for (h, hue_name) in counts.hues.iter().enumerate() {
            let color = rgb(PALETTE[h % PALETTE.len()]);
            chart
                .draw_series(counts.counts.iter().enumerate().map(move |(c, row)| {
                    let j = c * stride + h;
                    let mut bar = Rectangle::new(
                        [
                            (SegmentValue::Exact(j), 0.0),
                            (SegmentValue::Exact(j + 1), row[h] as f64),
                        ],
                        color.filled(),
                    );
                    bar.set_margin(0, 0, 2, 2);
                    bar
                }))?
                .label(hue_name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        debug!("grouped counts by {}", hue);
        Ok(())
    }

    fn draw_category_means(
        root: &Area,
        title: &str,
        axis: &str,
        value: &str,
        points: &[CategoryMean],
    ) -> DrawResult {
        let labels: Vec<String> = points.iter().map(|p| p.category.clone()).collect();
        let n = labels.len().max(1);
        let color = rgb(BAR_COLOR);

        let (y_lo, y_hi) =
            padded_range(points.iter().flat_map(|p| [p.ci_low, p.ci_high]), false);

        let mut chart = ChartBuilder::on(root)
            .caption(title, CAPTION_FONT)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), y_lo..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| segment_label(&labels, x))
            .x_desc(axis)
            .y_desc(value)
            .draw()?;

        let finite: Vec<(usize, &CategoryMean)> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.mean.is_finite())
            .collect();

        chart.draw_series(LineSeries::new(
            finite
                .iter()
                .map(|&(i, p)| (SegmentValue::CenterOf(i), p.mean)),
            color.stroke_width(2),
        ))?;
        chart.draw_series(finite.iter().map(|&(i, p)| {
            ErrorBar::new_vertical(
                SegmentValue::CenterOf(i),
                p.ci_low,
                p.mean,
                p.ci_high,
                color.stroke_width(2),
                10,
            )
        }))?;
        chart.draw_series(
            finite
                .iter()
                .map(|&(i, p)| Circle::new((SegmentValue::CenterOf(i), p.mean), 5, color.filled())),
        )?;

        Ok(())
    }

    fn draw_time_series(
        root: &Area,
        title: &str,
        (x_axis, y_axis): (&str, &str),
        points: &[SeriesPoint],
        x_window: Option<(usize, usize)>,
        markers: &[EventMarker],
        color: Rgb,
    ) -> DrawResult {
        let color = rgb(color);
        let (x_lo, x_hi) = x_window.unwrap_or((0, points.len().saturating_sub(1)));
        let in_window = |i: usize| i >= x_lo && i <= x_hi;

        let visible: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .filter(|(i, p)| in_window(*i) && p.value.is_finite())
            .map(|(i, p)| (i, p.value))
            .collect();
        let (y_lo, y_hi) = padded_range(visible.iter().map(|&(_, v)| v), false);

        let mut chart = ChartBuilder::on(root)
            .caption(title, CAPTION_FONT)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi.max(x_lo + 1), y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_labels(10)
            .x_label_formatter(&|i: &usize| {
                points.get(*i).map(|p| p.label.clone()).unwrap_or_default()
            })
            .x_desc(x_axis)
            .y_desc(y_axis)
            .draw()?;

        for marker in markers.iter().filter(|m| in_window(m.row_index)) {
            let style = rgb(marker.kind.color()).stroke_width(4);
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(marker.row_index, y_lo), (marker.row_index, y_hi)],
                style,
            )))?;
        }

        chart.draw_series(LineSeries::new(visible.iter().copied(), color.stroke_width(2)))?;
        chart.draw_series(
            visible
                .iter()
                .map(|&(i, v)| Circle::new((i, v), 3, color.filled())),
        )?;

        Ok(())
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Axis range covering all finite `values` with 10% headroom.
///
/// With `include_zero` the range always contains 0 and starts there for
/// non-negative data.
fn padded_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = if include_zero {
        (0.0_f64, 0.0_f64)
    } else {
        (f64::INFINITY, f64::NEG_INFINITY)
    };
    for v in values.into_iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }

    let pad = ((hi - lo) * 0.1).max(1e-3);
    let lo = if include_zero && lo >= 0.0 { 0.0 } else { lo - pad };
    (lo, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::plan::ChartBody;

    #[test]
    fn padded_range_starts_counts_at_zero() {
        let (lo, hi) = padded_range([3.0, 10.0], true);
        assert_eq!(lo, 0.0);
        assert!((hi - 11.0).abs() < 1e-9);
    }

    #[test]
    fn padded_range_handles_negative_and_empty_input() {
        let (lo, hi) = padded_range([-0.02, 0.04, f64::NAN], false);
        assert!((lo - -0.026).abs() < 1e-9);
        assert!((hi - 0.046).abs() < 1e-9);

        assert_eq!(padded_range(std::iter::empty::<f64>(), false), (0.0, 1.0));
    }

    #[test]
    fn flat_series_still_has_height() {
        let (lo, hi) = padded_range([0.05, 0.05], false);
        assert!(hi > lo);
    }

    #[test]
    fn segment_labels_only_at_centers() {
        let labels = vec!["Internet".to_string(), "Live Phone".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Live Phone");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(1)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(5)), "");
    }

    #[test]
    fn image_paths_are_numbered_slugs() {
        let renderer = ChartRenderer::new("out", (800, 400));
        let chart = ChartSpec::new(
            "Polling Methods",
            ChartBody::CategoryCounts {
                axis: "Mode".to_string(),
                bars: Vec::new(),
            },
        );
        assert_eq!(
            renderer.image_path(2, &chart),
            PathBuf::from("out").join("03-polling-methods.png")
        );
    }

    #[test]
    fn manifest_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path(), (800, 400));
        let charts = vec![ChartSpec::new(
            "Polling Methods",
            ChartBody::CategoryCounts {
                axis: "Mode".to_string(),
                bars: vec![("Internet".to_string(), 4)],
            },
        )];

        let path = renderer.write_manifest(&charts).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json[0]["title"], "Polling Methods");
        assert_eq!(json[0]["axis"], "Mode");
    }
}
