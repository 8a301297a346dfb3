//! Pollscope - Poll Dataset Summaries & Campaign Timeline Charts
//!
//! Loads a poll CSV, keeps voter polls, summarizes them and renders
//! exploratory charts with the campaign events marked.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;
