//! Poll Report Module
//! Runs the analysis pass over a loaded poll table and formats the summary tables.

use crate::charts::{ChartPlanner, ChartSpec, PlanInputs, SeriesPoint};
use crate::data::columns::{AFFILIATION, DIFFERENCE, MODE, POPULATION, START_DATE};
use crate::data::populations::{LIKELY_VOTERS, REGISTERED_VOTERS};
use crate::data::{DataProcessor, ProcessorError};
use crate::stats::{
    Annotations, DateIndex, EventAnnotator, StatsCalculator, SummaryTable, WindowError,
    CAMPAIGN_EVENTS, CAMPAIGN_MONTHS,
};
use polars::prelude::*;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Everything produced by one pass over the poll table.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Likely + Registered Voter polls.
    pub all: SummaryTable,
    pub registered: SummaryTable,
    pub likely: SummaryTable,
    /// Voter polls averaged per Start Date, ascending.
    pub daily: DataFrame,
    /// Row bounds of the Sept-Nov window in `daily`.
    pub window: Option<(usize, usize)>,
    pub annotations: Annotations,
    pub charts: Vec<ChartSpec>,
}

impl Analysis {
    /// The ALL, RV and LV tables as printed to stdout.
    pub fn summary_report(&self) -> String {
        let mut out = String::new();
        for (label, table) in [
            ("ALL", &self.all),
            ("RV", &self.registered),
            ("LV", &self.likely),
        ] {
            out.push_str("\n\n");
            out.push_str(&format_summary(label, table));
        }
        out
    }
}

/// Filter, summarize, window and plan charts for a raw poll table.
pub fn analyze(raw: &DataFrame) -> Result<Analysis, AnalysisError> {
    let affiliation_counts = StatsCalculator::category_counts(raw, AFFILIATION)?;
    let affiliation_by_population =
        StatsCalculator::grouped_category_counts(raw, AFFILIATION, POPULATION)?;
    let mode_counts = StatsCalculator::category_counts(raw, MODE)?;

    let voters = DataProcessor::filter_populations(raw)?;
    let voters = DataProcessor::with_difference(&voters)?;
    info!(
        "{} of {} polls are Likely/Registered Voter polls",
        voters.height(),
        raw.height()
    );

    let all = StatsCalculator::summarize(&voters, &[DIFFERENCE])?;
    let mode_differences = StatsCalculator::category_means(&voters, MODE, DIFFERENCE)?;

    let rv = DataProcessor::filter_by_category(&voters, POPULATION, &[REGISTERED_VOTERS])?;
    let lv = DataProcessor::filter_by_category(&voters, POPULATION, &[LIKELY_VOTERS])?;
    let registered = StatsCalculator::summarize(&rv, &[DIFFERENCE])?;
    let likely = StatsCalculator::summarize(&lv, &[DIFFERENCE])?;

    let daily = StatsCalculator::summarize_grouped(&voters, START_DATE)?;
    let daily_differences = series_points(&daily, START_DATE, DIFFERENCE)?;

    let index = DateIndex::build(&daily, START_DATE, &CAMPAIGN_MONTHS)?;
    let window = match index.bounds() {
        Ok(bounds) => {
            info!(
                "campaign window spans rows {}..={} ({} dates outside)",
                bounds.0,
                bounds.1,
                index.skipped()
            );
            Some(bounds)
        }
        Err(e @ WindowError::EmptyWindow { .. }) => {
            warn!("{}; skipping the event-marked chart", e);
            None
        }
        Err(e) => return Err(e.into()),
    };

    let annotations = EventAnnotator::annotate(&index, &CAMPAIGN_EVENTS);
    if annotations.skipped > 0 {
        info!(
            "{} of {} campaign events have no poll on their date",
            annotations.skipped,
            CAMPAIGN_EVENTS.len()
        );
    }

    let charts = ChartPlanner::plan(&PlanInputs {
        affiliation_counts: &affiliation_counts,
        affiliation_by_population: &affiliation_by_population,
        mode_counts: &mode_counts,
        all: &all,
        mode_differences: &mode_differences,
        registered: &registered,
        likely: &likely,
        daily_differences: &daily_differences,
        window,
        markers: &annotations.markers,
    });

    Ok(Analysis {
        all,
        registered,
        likely,
        daily,
        window,
        annotations,
        charts,
    })
}

/// Pairs of (label, value) from two columns, in row order. Null values become NaN.
fn series_points(df: &DataFrame, label: &str, value: &str) -> PolarsResult<Vec<SeriesPoint>> {
    let labels = df.column(label)?.cast(&DataType::String)?;
    let values = df.column(value)?.cast(&DataType::Float64)?;

    Ok(labels
        .str()?
        .into_iter()
        .zip(values.f64()?.into_iter())
        .map(|(l, v)| SeriesPoint {
            label: l.unwrap_or_default().to_string(),
            value: v.unwrap_or(f64::NAN),
        })
        .collect())
}

/// Render a summary table with `<label>: AVG` and `<label>: STDEV` columns.
pub fn format_summary(label: &str, table: &SummaryTable) -> String {
    let avg_header = format!("{label}: AVG");
    let std_header = format!("{label}: STDEV");

    let cells: Vec<(&str, String, String)> = table
        .rows
        .iter()
        .map(|row| (row.field.as_str(), format_value(row.mean), format_value(row.std)))
        .collect();

    let name_width = cells.iter().map(|c| c.0.len()).max().unwrap_or(0);
    let avg_width = cells
        .iter()
        .map(|c| c.1.len())
        .chain([avg_header.len()])
        .max()
        .unwrap_or(0);
    let std_width = cells
        .iter()
        .map(|c| c.2.len())
        .chain([std_header.len()])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:name_width$}  {:>avg_width$}  {:>std_width$}",
        "", avg_header, std_header
    );
    for (name, avg, std) in &cells {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>avg_width$}  {:>std_width$}",
            name, avg, std
        );
    }
    out
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.6}")
    }
}
