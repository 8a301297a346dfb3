//! Campaign Window Module
//! Locates the Sept-Nov 2016 rows of a date-grouped table and the debate /
//! letter-release events inside it.

use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Month prefixes ("YYYY-MM") of the final campaign stretch.
pub const CAMPAIGN_MONTHS: [&str; 3] = ["2016-09", "2016-10", "2016-11"];

/// Length of a "YYYY-MM" month prefix.
const MONTH_PREFIX_LEN: usize = 7;

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("No '{date_key}' value falls in months {prefixes:?}")]
    EmptyWindow {
        date_key: String,
        prefixes: Vec<String>,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Debate,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignEvent {
    pub date: &'static str,
    pub kind: EventKind,
}

/// The three presidential debates and the Comey letter release.
pub const CAMPAIGN_EVENTS: [CampaignEvent; 4] = [
    CampaignEvent {
        date: "2016-09-26",
        kind: EventKind::Debate,
    },
    CampaignEvent {
        date: "2016-10-09",
        kind: EventKind::Debate,
    },
    CampaignEvent {
        date: "2016-10-19",
        kind: EventKind::Debate,
    },
    CampaignEvent {
        date: "2016-10-28",
        kind: EventKind::Letter,
    },
];

/// Row positions of in-window dates of one table.
#[derive(Debug, Clone, Default)]
pub struct DateIndex {
    date_key: String,
    prefixes: Vec<String>,
    positions: BTreeMap<String, usize>,
    skipped: usize,
}

impl DateIndex {
    /// Scan `date_key` in row order and record the position of every date whose
    /// month prefix is one of `month_prefixes`.
    ///
    /// A date seen twice keeps its last position.
    pub fn build(
        df: &DataFrame,
        date_key: &str,
        month_prefixes: &[&str],
    ) -> Result<Self, WindowError> {
        let dates = df.column(date_key)?.cast(&DataType::String)?;

        let mut positions = BTreeMap::new();
        let mut skipped = 0;
        for (row, date) in dates.str()?.into_iter().enumerate() {
            match date {
                Some(date) if Self::in_window(date, month_prefixes) => {
                    positions.insert(date.to_string(), row);
                }
                _ => skipped += 1,
            }
        }

        debug!(
            "date index on '{}': {} in window, {} rows skipped",
            date_key,
            positions.len(),
            skipped
        );

        Ok(Self {
            date_key: date_key.to_string(),
            prefixes: month_prefixes.iter().map(|p| p.to_string()).collect(),
            positions,
            skipped,
        })
    }

    fn in_window(date: &str, month_prefixes: &[&str]) -> bool {
        date.get(..MONTH_PREFIX_LEN)
            .is_some_and(|month| month_prefixes.contains(&month))
    }

    pub fn position(&self, date: &str) -> Option<usize> {
        self.positions.get(date).copied()
    }

    /// Rows outside the window (or with no date).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.positions.iter().map(|(d, &p)| (d.as_str(), p))
    }

    /// First and last in-window row position.
    pub fn bounds(&self) -> Result<(usize, usize), WindowError> {
        let min = self.positions.values().min();
        let max = self.positions.values().max();
        match (min, max) {
            (Some(&min), Some(&max)) => Ok((min, max)),
            _ => Err(WindowError::EmptyWindow {
                date_key: self.date_key.clone(),
                prefixes: self.prefixes.clone(),
            }),
        }
    }
}

/// Computes the row bounds of the campaign window.
pub struct DateWindower;

impl DateWindower {
    /// Min and max row position whose `date_key` month is in `month_prefixes`.
    pub fn window_bounds(
        df: &DataFrame,
        date_key: &str,
        month_prefixes: &[&str],
    ) -> Result<(usize, usize), WindowError> {
        DateIndex::build(df, date_key, month_prefixes)?.bounds()
    }
}

/// An event located on a row of the date-grouped table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMarker {
    pub row_index: usize,
    pub date: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Annotations {
    /// Sorted by row index.
    pub markers: Vec<EventMarker>,
    /// Events whose date has no row in the index.
    pub skipped: usize,
}

/// Places campaign events on the rows of a [`DateIndex`].
pub struct EventAnnotator;

impl EventAnnotator {
    /// Exact-date lookup of each event; unmatched events are skipped and counted.
    pub fn annotate(index: &DateIndex, events: &[CampaignEvent]) -> Annotations {
        let mut markers = Vec::new();
        let mut skipped = 0;

        for event in events {
            match index.position(event.date) {
                Some(row_index) => markers.push(EventMarker {
                    row_index,
                    date: event.date.to_string(),
                    kind: event.kind,
                }),
                None => {
                    info!("no polls started on {} ({:?}); marker skipped", event.date, event.kind);
                    skipped += 1;
                }
            }
        }

        markers.sort_by_key(|m| m.row_index);
        Annotations { markers, skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(values: &[&str]) -> DataFrame {
        df!("Start Date" => values).unwrap()
    }

    #[test]
    fn window_excludes_out_of_range_months() {
        let df = dates(&["2016-08-15", "2016-09-01", "2016-11-04", "2016-12-01"]);

        let bounds = DateWindower::window_bounds(&df, "Start Date", &CAMPAIGN_MONTHS).unwrap();
        assert_eq!(bounds, (1, 2));

        let index = DateIndex::build(&df, "Start Date", &CAMPAIGN_MONTHS).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.skipped(), 2);
        assert_eq!(index.position("2016-08-15"), None);
        assert_eq!(index.position("2016-11-04"), Some(2));
    }

    #[test]
    fn empty_window_is_a_named_error() {
        let df = dates(&["2015-09-01", "2016-12-01", "bad"]);

        let err = DateWindower::window_bounds(&df, "Start Date", &CAMPAIGN_MONTHS).unwrap_err();
        assert!(matches!(err, WindowError::EmptyWindow { ref date_key, .. } if date_key == "Start Date"));
    }

    #[test]
    fn null_dates_are_skipped() {
        let df = df!("Start Date" => [None, Some("2016-10-01")]).unwrap();
        let index = DateIndex::build(&df, "Start Date", &CAMPAIGN_MONTHS).unwrap();
        assert_eq!(index.skipped(), 1);
        assert_eq!(index.bounds().unwrap(), (1, 1));
    }

    #[test]
    fn events_map_to_rows_and_missing_dates_are_skipped() {
        let df = dates(&["2016-10-01", "2016-10-09", "2016-10-20", "2016-10-28"]);
        let index = DateIndex::build(&df, "Start Date", &CAMPAIGN_MONTHS).unwrap();

        let annotations = EventAnnotator::annotate(&index, &CAMPAIGN_EVENTS);

        assert_eq!(
            annotations.markers,
            vec![
                EventMarker {
                    row_index: 1,
                    date: "2016-10-09".to_string(),
                    kind: EventKind::Debate,
                },
                EventMarker {
                    row_index: 3,
                    date: "2016-10-28".to_string(),
                    kind: EventKind::Letter,
                },
            ]
        );
        // 2016-09-26 and 2016-10-19 have no rows
        assert_eq!(annotations.skipped, 2);
    }

    #[test]
    fn event_lookup_is_exact() {
        let df = dates(&["2016-09-26 00:00", "2016-10-19"]);
        let index = DateIndex::build(&df, "Start Date", &CAMPAIGN_MONTHS).unwrap();

        let annotations = EventAnnotator::annotate(&index, &CAMPAIGN_EVENTS);
        assert_eq!(annotations.markers.len(), 1);
        assert_eq!(annotations.markers[0].date, "2016-10-19");
    }
}
