//! Data Processor Module
//! Row filtering and derived columns for the poll table.

use super::columns::{CLINTON, DIFFERENCE, POPULATION, TRUMP};
use super::populations::{LIKELY_VOTERS, REGISTERED_VOTERS};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Populations kept for the voter analysis; "Adults" polls are dropped.
pub const VOTER_POPULATIONS: [&str; 2] = [LIKELY_VOTERS, REGISTERED_VOTERS];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' not found in poll table")]
    MissingColumn(String),
}

/// Handles filtering and derivation on the poll table.
pub struct DataProcessor;

impl DataProcessor {
    /// Keep rows whose `column` equals one of `values`, preserving row order.
    ///
    /// Null cells never match.
    pub fn filter_by_category(
        df: &DataFrame,
        column: &str,
        values: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        Self::require_columns(df, &[column])?;

        let predicate = values
            .iter()
            .map(|v| col(column).eq(lit(*v)))
            .reduce(|acc, e| acc.or(e))
            .unwrap_or_else(|| lit(false));

        let filtered = df.clone().lazy().filter(predicate).collect()?;
        debug!(
            "filter {} in {:?}: kept {} of {} rows",
            column,
            values,
            filtered.height(),
            df.height()
        );
        Ok(filtered)
    }

    /// Keep Likely Voter and Registered Voter polls only.
    pub fn filter_populations(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::filter_by_category(df, POPULATION, &VOTER_POPULATIONS)
    }

    /// Add the `Difference` column: (Clinton - Trump) / 100, positive favors Clinton.
    pub fn with_difference(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::require_columns(df, &[CLINTON, TRUMP])?;

        let diff = ((col(CLINTON).cast(DataType::Float64) - col(TRUMP).cast(DataType::Float64))
            / lit(100.0))
        .alias(DIFFERENCE);

        let df = df.clone().lazy().with_column(diff).collect()?;
        Ok(df)
    }

    /// Names of numeric columns, in table order.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    fn require_columns(df: &DataFrame, names: &[&str]) -> Result<(), ProcessorError> {
        for name in names {
            if df.column(name).is_err() {
                return Err(ProcessorError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Population" => [Some("Likely Voters"), Some("Adults"), Some("Registered Voters"), None, Some("Likely Voters")],
            "Clinton" => [Some(48.0), Some(51.0), Some(50.0), Some(47.0), None],
            "Trump" => [44.0, 40.0, 46.0, 45.0, 43.0],
            "Question Iteration" => [1i64, 1, 2, 1, 1]
        )
        .unwrap()
    }

    #[test]
    fn filter_keeps_only_voter_populations_in_order() {
        let df = sample();
        let filtered = DataProcessor::filter_populations(&df).unwrap();

        assert!(filtered.height() <= df.height());
        let pops: Vec<_> = filtered
            .column("Population")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        assert_eq!(
            pops,
            vec!["Likely Voters", "Registered Voters", "Likely Voters"]
        );
    }

    #[test]
    fn filter_may_return_empty_table() {
        let df = sample();
        let filtered = DataProcessor::filter_by_category(&df, "Population", &["Nobody"]).unwrap();
        assert_eq!(filtered.height(), 0);

        let none = DataProcessor::filter_by_category(&df, "Population", &[]).unwrap();
        assert_eq!(none.height(), 0);
    }

    #[test]
    fn filter_on_missing_column_fails() {
        let err = DataProcessor::filter_by_category(&sample(), "Party", &["Dem"]).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(c) if c == "Party"));
    }

    #[test]
    fn difference_is_margin_over_hundred() {
        let df = DataProcessor::with_difference(&sample()).unwrap();
        let diff = df.column("Difference").unwrap().f64().unwrap();

        assert!((diff.get(0).unwrap() - 0.04).abs() < 1e-12);
        assert!((diff.get(1).unwrap() - 0.11).abs() < 1e-12);
        assert_eq!(diff.get(4), None);
    }

    #[test]
    fn numeric_columns_skip_text() {
        let cols = DataProcessor::numeric_columns(&sample());
        assert_eq!(cols, vec!["Clinton", "Trump", "Question Iteration"]);
    }
}
