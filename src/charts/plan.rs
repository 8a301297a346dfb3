//! Chart Plan Module
//! Describes every chart of a run as plain data, ready for the renderer.

use crate::stats::{CategoryMean, EventKind, EventMarker, GroupedCounts, SummaryTable};
use serde::Serialize;

/// RGB color usable both by the renderer and in the JSON manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BAR_COLOR: Rgb = Rgb(76, 114, 176); // Steel blue
pub const LIGHT_GREEN: Rgb = Rgb(144, 238, 144);
pub const GREEN: Rgb = Rgb(0, 128, 0);
pub const PURPLE: Rgb = Rgb(128, 0, 128);
pub const DEBATE_COLOR: Rgb = Rgb(128, 128, 128); // Grey
pub const LETTER_COLOR: Rgb = Rgb(255, 0, 0); // Red

/// Hue palette for grouped bars
pub const PALETTE: [Rgb; 6] = [
    Rgb(76, 114, 176),
    Rgb(221, 132, 82),
    Rgb(85, 168, 104),
    Rgb(196, 78, 82),
    Rgb(129, 114, 179),
    Rgb(147, 120, 96),
];

impl EventKind {
    pub fn color(self) -> Rgb {
        match self {
            EventKind::Debate => DEBATE_COLOR,
            EventKind::Letter => LETTER_COLOR,
        }
    }
}

/// One bar with a symmetric error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBarPoint {
    pub label: String,
    pub value: f64,
    pub error: f64,
}

/// One point of a labelled series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartBody {
    /// Bar per category with its row count.
    CategoryCounts {
        axis: String,
        bars: Vec<(String, usize)>,
    },
    /// Bars per category, one per hue value.
    GroupedCounts {
        axis: String,
        hue: String,
        counts: GroupedCounts,
    },
    /// Field means with standard deviation error bars.
    SummaryBars {
        bars: Vec<ErrorBarPoint>,
        color: Rgb,
    },
    /// Joined category means with confidence interval bars.
    CategoryMeans {
        axis: String,
        value: String,
        points: Vec<CategoryMean>,
    },
    /// Series over row positions, optionally limited to a window and marked with events.
    TimeSeries {
        x_axis: String,
        y_axis: String,
        points: Vec<SeriesPoint>,
        x_window: Option<(usize, usize)>,
        markers: Vec<EventMarker>,
        color: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    #[serde(flatten)]
    pub body: ChartBody,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>, body: ChartBody) -> Self {
        Self {
            title: title.into(),
            body,
        }
    }

    /// File-name friendly form of the title.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for c in self.title.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.trim_end_matches('-').to_string()
    }
}

/// Everything the planner needs from one analysis pass.
pub struct PlanInputs<'a> {
    pub affiliation_counts: &'a [(String, usize)],
    pub affiliation_by_population: &'a GroupedCounts,
    pub mode_counts: &'a [(String, usize)],
    pub all: &'a SummaryTable,
    pub mode_differences: &'a [CategoryMean],
    pub registered: &'a SummaryTable,
    pub likely: &'a SummaryTable,
    pub daily_differences: &'a [SeriesPoint],
    /// `None` when no poll started inside the campaign window.
    pub window: Option<(usize, usize)>,
    pub markers: &'a [EventMarker],
}

/// Turns analysis results into the ordered list of charts.
pub struct ChartPlanner;

impl ChartPlanner {
    pub fn plan(inputs: &PlanInputs<'_>) -> Vec<ChartSpec> {
        let mut charts = vec![
            ChartSpec::new(
                "Poll Affiliations",
                ChartBody::CategoryCounts {
                    axis: "Affiliation".to_string(),
                    bars: inputs.affiliation_counts.to_vec(),
                },
            ),
            ChartSpec::new(
                "LV and RV Poll Affiliations",
                ChartBody::GroupedCounts {
                    axis: "Affiliation".to_string(),
                    hue: "Population".to_string(),
                    counts: inputs.affiliation_by_population.clone(),
                },
            ),
            ChartSpec::new(
                "Polling Methods",
                ChartBody::CategoryCounts {
                    axis: "Mode".to_string(),
                    bars: inputs.mode_counts.to_vec(),
                },
            ),
            ChartSpec::new(
                "Average of All Polls",
                ChartBody::SummaryBars {
                    bars: Self::summary_bars(inputs.all),
                    color: BAR_COLOR,
                },
            ),
            ChartSpec::new(
                "Comparing Averages between Types of Polling: Clinton(+)/Trump(-)",
                ChartBody::CategoryMeans {
                    axis: "Mode".to_string(),
                    value: "Difference".to_string(),
                    points: inputs.mode_differences.to_vec(),
                },
            ),
            ChartSpec::new(
                "Poll Average: Registered Voters",
                ChartBody::SummaryBars {
                    bars: Self::summary_bars(inputs.registered),
                    color: LIGHT_GREEN,
                },
            ),
            ChartSpec::new(
                "Poll Average: Likely Voters",
                ChartBody::SummaryBars {
                    bars: Self::summary_bars(inputs.likely),
                    color: GREEN,
                },
            ),
            ChartSpec::new(
                "Daily Polling Means: Differences Clinton(+)/Trump(-)",
                Self::daily_series(inputs.daily_differences, None, &[]),
            ),
        ];

        if let Some(window) = inputs.window {
            charts.push(ChartSpec::new(
                "Daily Polling Means with Debates and Comey Letter Event Marked",
                Self::daily_series(inputs.daily_differences, Some(window), inputs.markers),
            ));
        }

        charts
    }

    fn summary_bars(table: &SummaryTable) -> Vec<ErrorBarPoint> {
        table
            .rows
            .iter()
            .map(|row| ErrorBarPoint {
                label: row.field.clone(),
                value: row.mean,
                error: row.std,
            })
            .collect()
    }

    fn daily_series(
        points: &[SeriesPoint],
        x_window: Option<(usize, usize)>,
        markers: &[EventMarker],
    ) -> ChartBody {
        ChartBody::TimeSeries {
            x_axis: "Start Date".to_string(),
            y_axis: "Difference".to_string(),
            points: points.to_vec(),
            x_window,
            markers: markers.to_vec(),
            color: PURPLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::FieldSummary;

    fn summary(mean: f64) -> SummaryTable {
        SummaryTable {
            rows: vec![FieldSummary {
                field: "Clinton".to_string(),
                count: 3,
                mean,
                std: 2.0,
            }],
        }
    }

    fn plan(window: Option<(usize, usize)>) -> Vec<ChartSpec> {
        let counts = vec![("None".to_string(), 3)];
        let grouped = GroupedCounts::default();
        let all = summary(50.0);
        let rv = summary(49.0);
        let lv = summary(51.0);
        let daily = vec![SeriesPoint {
            label: "2016-10-01".to_string(),
            value: 0.03,
        }];
        let markers = vec![EventMarker {
            row_index: 0,
            date: "2016-10-01".to_string(),
            kind: EventKind::Debate,
        }];

        ChartPlanner::plan(&PlanInputs {
            affiliation_counts: &counts,
            affiliation_by_population: &grouped,
            mode_counts: &counts,
            all: &all,
            mode_differences: &[],
            registered: &rv,
            likely: &lv,
            daily_differences: &daily,
            window,
            markers: &markers,
        })
    }

    #[test]
    fn plans_all_charts_in_order() {
        let charts = plan(Some((0, 0)));
        assert_eq!(charts.len(), 9);
        assert_eq!(charts[0].title, "Poll Affiliations");
        assert_eq!(charts[3].title, "Average of All Polls");

        match &charts[6].body {
            ChartBody::SummaryBars { bars, color } => {
                assert_eq!(*color, GREEN);
                assert_eq!(bars[0].value, 51.0);
                assert_eq!(bars[0].error, 2.0);
            }
            other => panic!("unexpected body {other:?}"),
        }

        match &charts[8].body {
            ChartBody::TimeSeries {
                x_window, markers, ..
            } => {
                assert_eq!(*x_window, Some((0, 0)));
                assert_eq!(markers.len(), 1);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn windowed_chart_is_dropped_without_window() {
        let charts = plan(None);
        assert_eq!(charts.len(), 8);
        assert!(charts.iter().all(|c| !c.title.contains("Debates")));
    }

    #[test]
    fn slug_is_file_name_safe() {
        let chart = ChartSpec::new(
            "Comparing Averages between Types of Polling: Clinton(+)/Trump(-)",
            ChartBody::CategoryCounts {
                axis: String::new(),
                bars: Vec::new(),
            },
        );
        assert_eq!(
            chart.slug(),
            "comparing-averages-between-types-of-polling-clinton-trump"
        );
    }

    #[test]
    fn manifest_entries_are_tagged() {
        let charts = plan(None);
        let json = serde_json::to_value(&charts[2]).unwrap();
        assert_eq!(json["kind"], "category_counts");
        assert_eq!(json["title"], "Polling Methods");
        assert_eq!(json["bars"][0][1], 3);
    }
}
