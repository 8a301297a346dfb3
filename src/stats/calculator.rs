//! Statistics Calculator Module
//! Descriptive summaries of the poll table: per-column mean/std, date grouping,
//! category counts and per-category means with confidence intervals.

use crate::data::columns::{NUM_OBSERVATIONS, QUESTION_ITERATION};
use crate::data::DataProcessor;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fields that are counters rather than measurements; never averaged.
pub const DEFAULT_EXCLUDED: [&str; 2] = [NUM_OBSERVATIONS, QUESTION_ITERATION];

/// Confidence level of the interval drawn around category means.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Mean and standard deviation of one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
}

/// Per-field summaries in table column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<FieldSummary>,
}

impl SummaryTable {
    pub fn get(&self, field: &str) -> Option<&FieldSummary> {
        self.rows.iter().find(|r| r.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.field.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Row counts of a category split by a second (hue) category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedCounts {
    pub categories: Vec<String>,
    pub hues: Vec<String>,
    /// `counts[category][hue]`, zero-filled.
    pub counts: Vec<Vec<usize>>,
}

impl GroupedCounts {
    pub fn count(&self, category: &str, hue: &str) -> Option<usize> {
        let c = self.categories.iter().position(|x| x == category)?;
        let h = self.hues.iter().position(|x| x == hue)?;
        Some(self.counts[c][h])
    }
}

/// Mean of a value column within one category, with its confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMean {
    pub category: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Mean and sample standard deviation (N-1) of the non-NaN values.
    ///
    /// Empty input gives NaN for both; a single value gives NaN std.
    pub fn describe(values: &[f64]) -> (f64, f64) {
        let mean = Statistics::mean(values.iter());
        let std = Statistics::std_dev(values.iter());
        (mean, std)
    }

    /// Summarize every numeric column except [`DEFAULT_EXCLUDED`] and `exclude`.
    ///
    /// Nulls and NaNs are skipped per column.
    pub fn summarize(df: &DataFrame, exclude: &[&str]) -> PolarsResult<SummaryTable> {
        let mut rows = Vec::new();

        for name in DataProcessor::numeric_columns(df) {
            if DEFAULT_EXCLUDED.contains(&name.as_str()) || exclude.contains(&name.as_str()) {
                continue;
            }

            let values = Self::column_values(df, &name)?;
            let (mean, std) = Self::describe(&values);
            rows.push(FieldSummary {
                field: name,
                count: values.len(),
                mean,
                std,
            });
        }

        Ok(SummaryTable { rows })
    }

    /// Group rows by exact `group_key` value and average every numeric column.
    ///
    /// One row per distinct non-null key, sorted ascending by key.
    pub fn summarize_grouped(df: &DataFrame, group_key: &str) -> PolarsResult<DataFrame> {
        let aggs: Vec<Expr> = DataProcessor::numeric_columns(df)
            .iter()
            .filter(|name| name.as_str() != group_key)
            .map(|name| col(name.as_str()).cast(DataType::Float64).mean())
            .collect();

        df.clone()
            .lazy()
            .filter(col(group_key).is_not_null())
            .group_by([col(group_key)])
            .agg(aggs)
            .sort([group_key], SortMultipleOptions::default())
            .collect()
    }

    /// Number of rows per distinct value of `column`, sorted by value. Nulls are dropped.
    pub fn category_counts(df: &DataFrame, column: &str) -> PolarsResult<Vec<(String, usize)>> {
        let counts = df
            .clone()
            .lazy()
            .filter(col(column).is_not_null())
            .group_by([col(column)])
            .agg([len().alias("count")])
            .sort([column], SortMultipleOptions::default())
            .collect()?;

        let names = counts.column(column)?.cast(&DataType::String)?;
        let totals = counts.column("count")?.cast(&DataType::UInt64)?;

        Ok(names
            .str()?
            .into_iter()
            .zip(totals.u64()?.into_iter())
            .filter_map(|(name, n)| Some((name?.to_string(), n? as usize)))
            .collect())
    }

    /// Row counts of `column` split by `hue`. Rows with a null in either are dropped.
    pub fn grouped_category_counts(
        df: &DataFrame,
        column: &str,
        hue: &str,
    ) -> PolarsResult<GroupedCounts> {
        let counts = df
            .clone()
            .lazy()
            .filter(col(column).is_not_null().and(col(hue).is_not_null()))
            .group_by([col(column), col(hue)])
            .agg([len().alias("count")])
            .collect()?;

        let names = counts.column(column)?.cast(&DataType::String)?;
        let hues = counts.column(hue)?.cast(&DataType::String)?;
        let totals = counts.column("count")?.cast(&DataType::UInt64)?;

        let mut table: BTreeMap<String, HashMap<String, usize>> = BTreeMap::new();
        let mut hue_set: BTreeSet<String> = BTreeSet::new();
        for ((name, h), n) in names
            .str()?
            .into_iter()
            .zip(hues.str()?.into_iter())
            .zip(totals.u64()?.into_iter())
        {
            if let (Some(name), Some(h), Some(n)) = (name, h, n) {
                hue_set.insert(h.to_string());
                table
                    .entry(name.to_string())
                    .or_default()
                    .insert(h.to_string(), n as usize);
            }
        }

        let hues: Vec<String> = hue_set.into_iter().collect();
        let counts = table
            .values()
            .map(|by_hue| {
                hues.iter()
                    .map(|h| by_hue.get(h).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Ok(GroupedCounts {
            categories: table.into_keys().collect(),
            hues,
            counts,
        })
    }

    /// Mean of `value` per distinct `category`, with a Student-t confidence interval.
    ///
    /// Categories are processed in parallel; the result is sorted by category.
    pub fn category_means(
        df: &DataFrame,
        category: &str,
        value: &str,
    ) -> PolarsResult<Vec<CategoryMean>> {
        let names = df.column(category)?.cast(&DataType::String)?;
        let values = df.column(value)?.cast(&DataType::Float64)?;

        let mut by_category: HashMap<String, Vec<f64>> = HashMap::new();
        for (name, v) in names.str()?.into_iter().zip(values.f64()?.into_iter()) {
            if let (Some(name), Some(v)) = (name, v) {
                if !v.is_nan() {
                    by_category.entry(name.to_string()).or_default().push(v);
                }
            }
        }

        let mut means: Vec<CategoryMean> = by_category
            .par_iter()
            .map(|(name, values)| Self::category_mean(name, values))
            .collect();
        means.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(means)
    }

    fn category_mean(name: &str, values: &[f64]) -> CategoryMean {
        let (mean, std) = Self::describe(values);
        let half_width = Self::confidence_half_width(values.len(), std);
        CategoryMean {
            category: name.to_string(),
            count: values.len(),
            mean,
            std,
            ci_low: mean - half_width,
            ci_high: mean + half_width,
        }
    }

    /// Half width of the two-sided t interval of a mean; 0 when undefined.
    fn confidence_half_width(n: usize, std: f64) -> f64 {
        if n < 2 || !std.is_finite() {
            return 0.0;
        }

        let q = 1.0 - (1.0 - CONFIDENCE_LEVEL) / 2.0;
        match StudentsT::new(0.0, 1.0, (n - 1) as f64) {
            Ok(dist) => dist.inverse_cdf(q) * std / (n as f64).sqrt(),
            Err(_) => 0.0,
        }
    }

    fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect())
    }
}
